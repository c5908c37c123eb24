//! Exclusive lock over the cache index file.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use crate::repository::CacheWriteError;

const RETRY_INTERVAL: Duration = Duration::from_millis(20);

/// A lock older than this was left by a writer that died while holding it.
const STALE_AFTER: Duration = Duration::from_secs(60);

/// Held while the index is read, modified and written back.
///
/// The lock is a file created with `create_new`; dropping the guard removes
/// it, including when the write fails half way. A lock file older than
/// [`STALE_AFTER`] is taken over.
#[derive(Debug)]
pub(crate) struct IndexLock {
    path: PathBuf,
}

impl IndexLock {
    /// Wait up to `timeout` for the lock.
    pub(crate) fn acquire(path: &Path, timeout: Duration) -> Result<Self, CacheWriteError> {
        let started = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(_) => {
                    tracing::trace!("Acquired index lock {}", path.display());
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if is_stale(path) {
                        tracing::warn!("Removing stale index lock {}", path.display());
                        match fs::remove_file(path) {
                            Ok(()) => continue,
                            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                            Err(source) => {
                                return Err(CacheWriteError::Io {
                                    path: path.to_path_buf(),
                                    source,
                                });
                            }
                        }
                    }
                    let waited = started.elapsed();
                    if waited >= timeout {
                        return Err(CacheWriteError::LockTimeout {
                            path: path.to_path_buf(),
                            waited,
                        });
                    }
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(source) => {
                    return Err(CacheWriteError::Io {
                        path: path.to_path_buf(),
                        source,
                    });
                }
            }
        }
    }
}

fn is_stale(path: &Path) -> bool {
    fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > STALE_AFTER)
}

impl Drop for IndexLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Failed to release index lock {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_holder_times_out_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.lock");

        let held = IndexLock::acquire(&path, Duration::ZERO).unwrap();
        let err = IndexLock::acquire(&path, Duration::from_millis(50)).unwrap_err();
        assert!(matches!(err, CacheWriteError::LockTimeout { .. }));

        drop(held);
        assert!(!path.exists());
        assert!(IndexLock::acquire(&path, Duration::ZERO).is_ok());
    }

    #[test]
    fn lock_left_by_dead_writer_is_taken_over() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.lock");
        let file = fs::File::create(&path).unwrap();
        file.set_modified(SystemTime::now() - STALE_AFTER * 2).unwrap();
        drop(file);

        let lock = IndexLock::acquire(&path, Duration::ZERO).unwrap();
        assert!(path.exists());
        drop(lock);
        assert!(!path.exists());
    }
}
