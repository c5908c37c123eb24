//! Error types raised by the proof cache.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Cache state could not be read.
///
/// Never fatal: lookups log it and fall back to regenerating the proof.
#[derive(Debug, Error)]
pub enum CacheReadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupted cache data in {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },
}

/// Cache state could not be written. Aborts the action.
#[derive(Debug, Error)]
pub enum CacheWriteError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(String),

    #[error("cache index {path} still locked after {waited:?}")]
    LockTimeout { path: PathBuf, waited: Duration },
}

impl CacheWriteError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| CacheWriteError::Io { path, source }
    }
}
