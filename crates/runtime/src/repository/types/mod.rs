//! Shared types for the proof cache.

mod proof_cache;

pub use proof_cache::{
    ArtifactMetadata, CacheEntry, CacheIndex, ContentHash, InvalidTestCaseId, ProofArtifact,
    TestCaseId,
};
