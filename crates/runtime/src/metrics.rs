//! Proof pipeline metrics and statistics.
//!
//! Tracks cache effectiveness and proof generation performance.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters updated by the orchestrator on every prepared action.
///
/// Uses atomics for lock-free access across threads.
#[derive(Debug, Default)]
pub struct ProofMetrics {
    /// Actions served from a valid cache entry
    cache_hits: AtomicU64,

    /// Actions that had to be proven
    cache_misses: AtomicU64,

    /// Total number of proofs successfully generated
    generated: AtomicU64,

    /// Total number of proof generations that failed
    failed: AtomicU64,

    /// Total time spent generating proofs (sum of all durations, in nanoseconds)
    total_proving_time_nanos: AtomicU64,
}

impl ProofMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a successful proof generation.
    pub fn record_success(&self, proving_time: Duration) {
        self.generated.fetch_add(1, Ordering::Relaxed);
        self.total_proving_time_nanos
            .fetch_add(proving_time.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Records a failed proof generation.
    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn generated(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Calculates average proof generation time.
    pub fn avg_proving_time(&self) -> Duration {
        let generated = self.generated();
        if generated == 0 {
            Duration::ZERO
        } else {
            let total_nanos = self.total_proving_time_nanos.load(Ordering::Relaxed);
            Duration::from_nanos(total_nanos / generated)
        }
    }

    /// Share of lookups served from cache as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.cache_hits();
        let total = hits + self.cache_misses();

        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }

    /// Creates a snapshot of all metrics for display/logging.
    ///
    /// Individual fields are read atomically, the snapshot as a whole is not.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits(),
            cache_misses: self.cache_misses(),
            generated: self.generated(),
            failed: self.failed(),
            avg_proving_time: self.avg_proving_time(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub generated: u64,
    pub failed: u64,
    pub avg_proving_time: Duration,
    pub hit_rate: f64,
}
