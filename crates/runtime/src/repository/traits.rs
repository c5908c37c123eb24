//! Repository contract for cached proofs.

use df_zk::CircuitKind;

use super::error::{CacheReadError, CacheWriteError};
use super::types::{CacheEntry, ContentHash, ProofArtifact, TestCaseId};

/// Durable store of proof artifacts keyed by (circuit kind, test case).
///
/// An entry is only ever replaced whole or evicted explicitly. Implementations
/// guard their shared index, but a single writer per key is the caller's
/// responsibility.
pub trait ProofCache: Send + Sync {
    /// Entry for the key, if one exists and can be read.
    ///
    /// Read failures are logged and reported as `None`.
    fn lookup(&self, kind: CircuitKind, test_case: &TestCaseId) -> Option<CacheEntry>;

    /// The entry matches `current` and its artifact is still readable.
    fn is_valid(&self, entry: &CacheEntry, current: &ContentHash) -> bool;

    fn load_artifact(&self, entry: &CacheEntry) -> Option<ProofArtifact>;

    /// Persist `artifact` under `test_case`, replacing any previous entry for
    /// the artifact's circuit kind.
    fn store(
        &self,
        test_case: &TestCaseId,
        artifact: &ProofArtifact,
    ) -> Result<CacheEntry, CacheWriteError>;

    /// Remove the entry and its artifact. Returns whether one existed.
    fn evict(&self, kind: CircuitKind, test_case: &TestCaseId) -> Result<bool, CacheWriteError>;

    /// All entries, ordered by key.
    fn entries(&self) -> Result<Vec<CacheEntry>, CacheReadError>;
}
