//! Contract-call collaborator.
//!
//! The orchestrator stops at [`CallArgs`]; sending them is delegated to a
//! [`GameActions`] implementation bound to the deployed game contract.
//! Transaction submission, gas and receipts belong to that implementation.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use df_zk::{CallArgs, CallValue, CircuitKind, FieldValue};

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("{entrypoint} reverted: {reason}")]
    Reverted {
        entrypoint: &'static str,
        reason: String,
    },

    #[error("{entrypoint} cannot take {actual} call arguments")]
    WrongCircuit {
        entrypoint: &'static str,
        actual: CircuitKind,
    },

    #[error("transport error: {0}")]
    Transport(String),
}

/// Result of a call accepted by the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub entrypoint: &'static str,
    pub tx_id: u64,
}

/// Game contract entrypoints gated by a proof.
#[async_trait]
pub trait GameActions: Send + Sync {
    async fn initialize_player(&self, args: CallArgs) -> Result<TxReceipt, ChainError>;

    async fn reveal_location(&self, args: CallArgs) -> Result<TxReceipt, ChainError>;

    async fn move_ship(&self, args: CallArgs) -> Result<TxReceipt, ChainError>;

    async fn use_key(&self, args: CallArgs) -> Result<TxReceipt, ChainError>;

    async fn find_artifact(&self, args: CallArgs) -> Result<TxReceipt, ChainError>;
}

/// Send `args` to the entrypoint matching its circuit.
pub async fn dispatch<C>(chain: &C, args: CallArgs) -> Result<TxReceipt, ChainError>
where
    C: GameActions + ?Sized,
{
    tracing::debug!(
        "Calling {} with {} public inputs",
        args.entrypoint(),
        args.inputs().len()
    );
    match args.kind() {
        CircuitKind::Init => chain.initialize_player(args).await,
        CircuitKind::Reveal => chain.reveal_location(args).await,
        CircuitKind::Move => chain.move_ship(args).await,
        CircuitKind::Whitelist => chain.use_key(args).await,
        CircuitKind::Biomebase => chain.find_artifact(args).await,
    }
}

// ============================================================================
// Recording mock
// ============================================================================

/// In-memory contract for testing without a chain.
///
/// Records every accepted call. `useKey` reverts unless the key hash was
/// registered with [`RecordingActions::add_keys`], the way the whitelist
/// contract does.
#[derive(Debug, Default)]
pub struct RecordingActions {
    calls: Mutex<Vec<CallArgs>>,
    keys: Mutex<HashSet<FieldValue>>,
    tx_counter: AtomicU64,
}

impl RecordingActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_keys(&self, key_hashes: impl IntoIterator<Item = FieldValue>) {
        lock(&self.keys).extend(key_hashes);
    }

    /// Calls accepted so far, in order.
    pub fn calls(&self) -> Vec<CallArgs> {
        lock(&self.calls).clone()
    }

    fn accept(
        &self,
        expected: CircuitKind,
        args: CallArgs,
    ) -> Result<TxReceipt, ChainError> {
        let entrypoint = expected.entrypoint();
        if args.kind() != expected {
            return Err(ChainError::WrongCircuit {
                entrypoint,
                actual: args.kind(),
            });
        }
        if args.proof().is_empty() {
            return Err(ChainError::Reverted {
                entrypoint,
                reason: "Failed to verify proof".to_string(),
            });
        }

        lock(&self.calls).push(args);
        let tx_id = self.tx_counter.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(TxReceipt { entrypoint, tx_id })
    }
}

#[async_trait]
impl GameActions for RecordingActions {
    async fn initialize_player(&self, args: CallArgs) -> Result<TxReceipt, ChainError> {
        self.accept(CircuitKind::Init, args)
    }

    async fn reveal_location(&self, args: CallArgs) -> Result<TxReceipt, ChainError> {
        self.accept(CircuitKind::Reveal, args)
    }

    async fn move_ship(&self, args: CallArgs) -> Result<TxReceipt, ChainError> {
        self.accept(CircuitKind::Move, args)
    }

    async fn use_key(&self, args: CallArgs) -> Result<TxReceipt, ChainError> {
        let registered = match args.inputs().first() {
            Some(CallValue::Uint(key_hash)) => lock(&self.keys).contains(key_hash),
            _ => false,
        };
        if !registered {
            return Err(ChainError::Reverted {
                entrypoint: CircuitKind::Whitelist.entrypoint(),
                reason: "invalid key".to_string(),
            });
        }
        self.accept(CircuitKind::Whitelist, args)
    }

    async fn find_artifact(&self, args: CallArgs) -> Result<TxReceipt, ChainError> {
        self.accept(CircuitKind::Biomebase, args)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use df_zk::{Address, ProofBytes};

    fn whitelist_args(key_hash: FieldValue) -> CallArgs {
        let recipient: Address = "0x8950bab77f29e8f81e6f78aea0a79badd88eeb13".parse().unwrap();
        CallArgs::new(
            CircuitKind::Whitelist,
            vec![key_hash.into(), recipient.into()],
            ProofBytes::new(vec![1; 4]),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn use_key_requires_registered_hash() {
        let chain = RecordingActions::new();
        chain.add_keys([FieldValue::from_u64(0x1234)]);

        let receipt = dispatch(&chain, whitelist_args(FieldValue::from_u64(0x1234)))
            .await
            .unwrap();
        assert_eq!(receipt.entrypoint, "useKey");

        let err = dispatch(&chain, whitelist_args(FieldValue::ZERO))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Reverted { .. }));
        assert_eq!(chain.calls().len(), 1);
    }

    #[tokio::test]
    async fn entrypoint_rejects_other_circuits() {
        let chain = RecordingActions::new();
        let args = CallArgs::new(
            CircuitKind::Biomebase,
            vec![1u64.into(); 5],
            ProofBytes::new(vec![1]),
        )
        .unwrap();

        let err = chain.initialize_player(args).await.unwrap_err();
        assert!(matches!(
            err,
            ChainError::WrongCircuit {
                entrypoint: "initializePlayer",
                actual: CircuitKind::Biomebase
            }
        ));
    }
}
