//! Proof cache repository.
//!
//! Proof generation takes seconds to minutes, so artifacts are kept between
//! runs and reused while the witness and circuit source they were proven
//! from are unchanged:
//! - [`ProofCache`] is the contract the orchestrator depends on
//! - [`FileProofCache`] keeps artifacts on disk under a JSON index

mod error;
mod file;
mod traits;
mod types;

pub use error::{CacheReadError, CacheWriteError};
pub use file::FileProofCache;
pub use traits::ProofCache;
pub use types::{
    ArtifactMetadata, CacheEntry, CacheIndex, ContentHash, InvalidTestCaseId, ProofArtifact,
    TestCaseId,
};
