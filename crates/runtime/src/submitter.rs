//! Async front end for the blocking proof pipeline.
//!
//! Proving blocks for seconds to minutes, so [`ActionSubmitter`] runs
//! [`Orchestrator::prepare`] on tokio's blocking pool and only awaits the
//! chain collaborator on the async side.

use std::sync::Arc;

use df_zk::{ActionRequest, CallArgs};

use crate::chain::{ChainError, GameActions, TxReceipt, dispatch};
use crate::orchestrator::{CacheStatus, Orchestrator, OrchestratorError, PreparedAction};
use crate::repository::TestCaseId;

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Prepare(#[from] OrchestratorError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("proof task failed: {0}")]
    Join(String),
}

/// A sent action and where its proof came from.
#[derive(Debug, Clone)]
pub struct Submission {
    pub receipt: TxReceipt,
    pub status: CacheStatus,
}

/// Proves actions off the async runtime and sends them to the chain.
///
/// Calls are not serialized here. Two concurrent `prepare` or `submit` calls
/// for the same circuit kind would share its directory and overwrite each
/// other's `Prover.toml`, so callers must await one before starting the next.
pub struct ActionSubmitter<C: ?Sized> {
    orchestrator: Arc<Orchestrator>,
    chain: Arc<C>,
}

impl<C> ActionSubmitter<C>
where
    C: GameActions + ?Sized + 'static,
{
    pub fn new(orchestrator: Arc<Orchestrator>, chain: Arc<C>) -> Self {
        Self {
            orchestrator,
            chain,
        }
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// Prepare `request` without sending it. Must not overlap another call
    /// for the same circuit kind.
    pub async fn prepare(
        &self,
        test_case: TestCaseId,
        request: ActionRequest,
    ) -> Result<PreparedAction, ActionError> {
        let orchestrator = Arc::clone(&self.orchestrator);

        // Use tokio::spawn_blocking to avoid blocking the async runtime
        let prepared = tokio::task::spawn_blocking(move || {
            orchestrator.prepare(&test_case, &request)
        })
        .await
        .map_err(|e| ActionError::Join(e.to_string()))??;

        Ok(prepared)
    }

    /// Send already prepared call arguments.
    pub async fn send(&self, call_args: CallArgs) -> Result<TxReceipt, ActionError> {
        Ok(dispatch(self.chain.as_ref(), call_args).await?)
    }

    /// Prepare `request` and send it to the matching entrypoint.
    pub async fn submit(
        &self,
        test_case: TestCaseId,
        request: ActionRequest,
    ) -> Result<Submission, ActionError> {
        let prepared = self.prepare(test_case, request).await?;
        let receipt = self.send(prepared.call_args).await?;
        tracing::info!(
            "{} accepted (tx {}, proof {:?})",
            receipt.entrypoint,
            receipt.tx_id,
            prepared.status
        );
        Ok(Submission {
            receipt,
            status: prepared.status,
        })
    }
}
