//! File-based ProofCache implementation.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use df_zk::{CircuitKind, ProofBytes};

use super::index_lock::IndexLock;
use crate::repository::{
    CacheEntry, CacheIndex, CacheReadError, CacheWriteError, ContentHash, ProofArtifact,
    ProofCache, TestCaseId,
};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Hex digits of the content hash kept in artifact file names.
const FILE_HASH_PREFIX: usize = 16;

/// File-based implementation of ProofCache.
///
/// Proof bytes live in one file per entry; `index.json` maps each
/// `(kind, test case)` key to its entry.
///
/// # Commit order
///
/// 1. **Artifact**: written to a temp file and renamed to a name derived from
///    the content hash, so it never overwrites the file a live entry points at
/// 2. **Index**: rewritten under [`IndexLock`] via temp file + rename (commit
///    point)
/// 3. **Cleanup**: the displaced entry's file is removed
///
/// A failed index write removes the new artifact again. A crash before step 2
/// leaves the previous entry intact; one after leaves at most an orphaned
/// file.
///
/// # Directory Structure
///
/// ```text
/// root/
/// ├── index.json
/// ├── index.lock            ← only while a writer holds it
/// └── artifacts/
///     ├── init/
///     │   └── planet_1_init-3f2a9c0d1e4b5a67.proof
///     └── whitelist/
///         └── key_1-0b1c2d3e4f506172.proof
/// ```
#[derive(Debug, Clone)]
pub struct FileProofCache {
    root: PathBuf,
    lock_timeout: Duration,
}

impl FileProofCache {
    /// Create a new file-based proof cache.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, CacheWriteError> {
        let root = root.as_ref().to_path_buf();
        let artifacts = root.join("artifacts");
        fs::create_dir_all(&artifacts).map_err(CacheWriteError::io(&artifacts))?;
        Ok(Self {
            root,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        })
    }

    /// How long a writer waits for another writer's index lock.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join("index.lock")
    }

    fn kind_dir(&self, kind: CircuitKind) -> PathBuf {
        self.root.join("artifacts").join(kind.to_string())
    }

    /// Path of the proof file an entry points at.
    pub fn artifact_path(&self, entry: &CacheEntry) -> PathBuf {
        self.kind_dir(entry.kind()).join(&entry.proof_file)
    }

    fn read_index(&self) -> Result<CacheIndex, CacheReadError> {
        let path = self.index_path();
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CacheIndex::default()),
            Err(source) => return Err(CacheReadError::Io { path, source }),
        };
        serde_json::from_str(&json).map_err(|e| CacheReadError::Corrupted {
            path,
            reason: e.to_string(),
        })
    }

    /// Index to modify under the lock. A corrupted index is started over;
    /// its entries were already unreadable to lookups.
    fn read_index_for_write(&self) -> Result<CacheIndex, CacheWriteError> {
        match self.read_index() {
            Ok(index) => Ok(index),
            Err(CacheReadError::Corrupted { path, reason }) => {
                tracing::warn!(
                    "Discarding corrupted cache index {}: {}",
                    path.display(),
                    reason
                );
                Ok(CacheIndex::default())
            }
            Err(CacheReadError::Io { path, source }) => Err(CacheWriteError::Io { path, source }),
        }
    }

    fn write_index(&self, index: &CacheIndex) -> Result<(), CacheWriteError> {
        let path = self.index_path();
        let json =
            serde_json::to_vec_pretty(index).map_err(|e| CacheWriteError::Json(e.to_string()))?;
        write_atomic(&path, &json)?;
        tracing::debug!("Saved cache index: {} entries", index.entries.len());
        Ok(())
    }

    fn commit_entry(&self, entry: &CacheEntry) -> Result<Option<CacheEntry>, CacheWriteError> {
        let _lock = IndexLock::acquire(&self.lock_path(), self.lock_timeout)?;
        let mut index = self.read_index_for_write()?;
        let displaced = index.insert(entry.clone());
        self.write_index(&index)?;
        Ok(displaced)
    }

    fn remove_artifact_file(&self, entry: &CacheEntry) {
        let path = self.artifact_path(entry);
        match fs::remove_file(&path) {
            Ok(()) => tracing::debug!("Removed proof artifact {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove proof artifact {}: {}", path.display(), e),
        }
    }
}

impl ProofCache for FileProofCache {
    fn lookup(&self, kind: CircuitKind, test_case: &TestCaseId) -> Option<CacheEntry> {
        match self.read_index() {
            Ok(index) => index.get(kind, test_case).cloned(),
            Err(e) => {
                tracing::warn!("Treating {kind}/{test_case} as a cache miss: {e}");
                None
            }
        }
    }

    fn is_valid(&self, entry: &CacheEntry, current: &ContentHash) -> bool {
        if entry.content_hash() != current {
            tracing::debug!(
                "Cache entry {} is stale (cached {}, current {})",
                entry.key(),
                entry.content_hash(),
                current
            );
            return false;
        }

        let path = self.artifact_path(entry);
        match File::open(&path).and_then(|file| file.metadata()) {
            Ok(metadata) => metadata.is_file() && metadata.len() == entry.size,
            Err(e) => {
                tracing::warn!("Cached proof {} unreadable: {}", path.display(), e);
                false
            }
        }
    }

    fn load_artifact(&self, entry: &CacheEntry) -> Option<ProofArtifact> {
        let path = self.artifact_path(entry);
        match fs::read(&path) {
            Ok(bytes) if bytes.len() as u64 == entry.size => Some(ProofArtifact::new(
                ProofBytes::new(bytes),
                entry.metadata.clone(),
            )),
            Ok(bytes) => {
                tracing::warn!(
                    "Cached proof {} has {} bytes, index records {}",
                    path.display(),
                    bytes.len(),
                    entry.size
                );
                None
            }
            Err(e) => {
                tracing::warn!("Failed to read cached proof {}: {}", path.display(), e);
                None
            }
        }
    }

    fn store(
        &self,
        test_case: &TestCaseId,
        artifact: &ProofArtifact,
    ) -> Result<CacheEntry, CacheWriteError> {
        let kind = artifact.kind();
        let dir = self.kind_dir(kind);
        fs::create_dir_all(&dir).map_err(CacheWriteError::io(&dir))?;

        let hash = artifact.content_hash().to_hex();
        let proof_file = format!("{test_case}-{}.proof", &hash[..FILE_HASH_PREFIX]);
        let bytes = artifact.bytes().as_bytes();
        let artifact_path = dir.join(&proof_file);
        let replaces_file = artifact_path.exists();
        write_atomic(&artifact_path, bytes)?;

        let entry = CacheEntry {
            test_case: test_case.clone(),
            metadata: artifact.metadata().clone(),
            proof_file,
            size: bytes.len() as u64,
        };

        let displaced = match self.commit_entry(&entry) {
            Ok(displaced) => displaced,
            Err(e) => {
                // A file that existed before may still back the indexed entry.
                if !replaces_file {
                    self.remove_artifact_file(&entry);
                }
                return Err(e);
            }
        };

        if let Some(old) = displaced
            && old.proof_file != entry.proof_file
        {
            self.remove_artifact_file(&old);
        }

        tracing::info!(
            "Cached {} proof for {} ({} bytes, hash {})",
            kind,
            test_case,
            entry.size,
            entry.content_hash()
        );
        Ok(entry)
    }

    fn evict(&self, kind: CircuitKind, test_case: &TestCaseId) -> Result<bool, CacheWriteError> {
        let removed = {
            let _lock = IndexLock::acquire(&self.lock_path(), self.lock_timeout)?;
            let mut index = self.read_index_for_write()?;
            let removed = index.remove(kind, test_case);
            if removed.is_some() {
                self.write_index(&index)?;
            }
            removed
        };

        match removed {
            Some(entry) => {
                self.remove_artifact_file(&entry);
                tracing::info!("Evicted cached proof {}", entry.key());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn entries(&self) -> Result<Vec<CacheEntry>, CacheReadError> {
        Ok(self.read_index()?.entries.into_values().collect())
    }
}

/// Write to a sibling temp file, flush to disk, then rename over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CacheWriteError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{file_name}.tmp"));

    let mut file = File::create(&temp_path).map_err(CacheWriteError::io(&temp_path))?;
    file.write_all(bytes)
        .and_then(|()| file.sync_all())
        .map_err(CacheWriteError::io(&temp_path))?;
    drop(file);

    fs::rename(&temp_path, path).map_err(CacheWriteError::io(path))?;
    Ok(())
}
