//! Universal prover interface for circuit proof generation.
//!
//! Defines the common interface implemented by all proving backends.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::circuit::CircuitHandle;
use crate::field::EncodingError;
use crate::witness::WitnessInput;

/// Raw proof bytes as the verifier consumes them.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ProofBytes(Vec<u8>);

impl ProofBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Parse the `0x`-prefixed (or bare) hex form.
    pub fn from_hex(input: &str) -> Result<Self, hex::FromHexError> {
        let digits = input.trim();
        let digits = digits.strip_prefix("0x").unwrap_or(digits);
        hex::decode(digits).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `0x`-prefixed hex, the form contract bindings accept for `bytes`.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for ProofBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProofBytes({} bytes)", self.0.len())
    }
}

impl Serialize for ProofBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ProofBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Identifies which proving backend generated a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofBackend {
    /// External `nargo` toolchain.
    Nargo,
    /// In-process stub engine; no security guarantees.
    Stub,
    /// Test doubles outside this crate.
    Custom,
}

// ============================================================================
// Errors
// ============================================================================

/// Failures of the external prover process.
#[derive(Debug, thiserror::Error)]
pub enum ProverProcessError {
    #[error("failed to write prover input {path}: {source}")]
    WriteInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("`{program}` killed after {after:?}")]
    TimedOut { program: String, after: Duration },

    #[error("proof file not found after proving: {0}")]
    MissingOutput(PathBuf),

    #[error("proof file {path} is malformed: {reason}")]
    MalformedOutput { path: PathBuf, reason: String },

    #[error("I/O error while supervising prover: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during proof generation.
///
/// Both are terminal for the action; nothing here retries.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("prover process failed: {0}")]
    ProverProcess(#[from] ProverProcessError),

    #[error("proof generation failed: {0}")]
    ProofGeneration(String),

    #[error("witness encoding failed: {0}")]
    Encoding(#[from] EncodingError),
}

// ============================================================================
// Prover trait
// ============================================================================

/// Universal prover interface for all proving backends.
///
/// Proving can take minutes and may write into the circuit directory, so
/// callers must not run two proofs for the same circuit concurrently.
pub trait Prover: Send + Sync {
    /// Backend recorded in proof metadata.
    fn backend(&self) -> ProofBackend;

    /// Generate a proof for `witness` against `circuit`.
    ///
    /// Identical inputs give proofs that verify identically, but backends
    /// that blind their proofs will not return the same bytes twice.
    fn prove(&self, circuit: &CircuitHandle, witness: &WitnessInput)
    -> Result<ProofBytes, ProofError>;
}

impl<P: Prover + ?Sized> Prover for Box<P> {
    fn backend(&self) -> ProofBackend {
        (**self).backend()
    }

    fn prove(
        &self,
        circuit: &CircuitHandle,
        witness: &WitnessInput,
    ) -> Result<ProofBytes, ProofError> {
        (**self).prove(circuit, witness)
    }
}
