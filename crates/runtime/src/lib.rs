//! Proof orchestration for on-chain game actions.
//!
//! Wires the circuit-facing pieces of `df-zk` into one pipeline per action:
//! witness construction, proof cache lookup, proving on a miss, and call
//! argument assembly. Consumers embed [`Orchestrator`] directly for blocking
//! use, or [`ActionSubmitter`] to prepare and send actions from async code.
//!
//! Modules are organized by responsibility:
//! - [`config`] loads orchestrator settings and world parameters
//! - [`repository`] persists proof artifacts keyed by content hash
//! - [`orchestrator`] hosts the per-action pipeline
//! - [`chain`] is the narrow interface to the contract caller
//! - [`submitter`] bridges the blocking pipeline into async callers
pub mod chain;
pub mod config;
pub mod orchestrator;
pub mod repository;
pub mod submitter;

mod metrics;

pub use chain::{ChainError, GameActions, RecordingActions, TxReceipt, dispatch};
pub use config::{
    CircuitConfig, ConfigError, OrchestratorConfig, ProverBackendKind, ProverConfig,
    load_game_params,
};
pub use metrics::{MetricsSnapshot, ProofMetrics};
pub use orchestrator::{CacheStatus, Orchestrator, OrchestratorError, PreparedAction};
pub use repository::{
    ArtifactMetadata, CacheEntry, CacheIndex, CacheReadError, CacheWriteError, ContentHash,
    FileProofCache, InvalidTestCaseId, ProofArtifact, ProofCache, TestCaseId,
};
pub use submitter::{ActionError, ActionSubmitter, Submission};
