//! Global atomic counters for verification activity.
//!
//! Counters are bumped at the call site and emitted together by
//! [`Metrics::flush`], typically once per verification call.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    actions_dropped: AtomicU64,
    seeds_executed: AtomicU64,
    seed_failures: AtomicU64,
    datasets_fetched: AtomicU64,
    dataset_cache_hits: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            actions_dropped: AtomicU64::new(0),
            seeds_executed: AtomicU64::new(0),
            seed_failures: AtomicU64::new(0),
            datasets_fetched: AtomicU64::new(0),
            dataset_cache_hits: AtomicU64::new(0),
        }
    }

    pub fn inc_actions_dropped(&self) {
        self.actions_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_seeds_executed(&self) {
        self.seeds_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// A seed whose executor call errored, timed out or panicked.
    pub fn inc_seed_failures(&self) {
        self.seed_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_datasets_fetched(&self) {
        self.datasets_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dataset_cache_hits(&self) {
        self.dataset_cache_hits.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "dataset_cache_hits", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            actions_dropped = self.actions_dropped(),
            seeds_executed = self.seeds_executed(),
            seed_failures = self.seed_failures(),
            datasets_fetched = self.datasets_fetched(),
            dataset_cache_hits = self.dataset_cache_hits(),
        );
    }

    pub fn actions_dropped(&self) -> u64 {
        self.actions_dropped.load(Ordering::Relaxed)
    }

    pub fn seeds_executed(&self) -> u64 {
        self.seeds_executed.load(Ordering::Relaxed)
    }

    pub fn seed_failures(&self) -> u64 {
        self.seed_failures.load(Ordering::Relaxed)
    }

    pub fn datasets_fetched(&self) -> u64 {
        self.datasets_fetched.load(Ordering::Relaxed)
    }

    pub fn dataset_cache_hits(&self) -> u64 {
        self.dataset_cache_hits.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.actions_dropped.store(0, Ordering::Relaxed);
        self.seeds_executed.store(0, Ordering::Relaxed);
        self.seed_failures.store(0, Ordering::Relaxed);
        self.datasets_fetched.store(0, Ordering::Relaxed);
        self.dataset_cache_hits.store(0, Ordering::Relaxed);
    }
}
