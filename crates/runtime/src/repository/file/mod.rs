//! File-based repository implementations.

mod index_lock;
mod proof_cache;

pub use proof_cache::FileProofCache;
