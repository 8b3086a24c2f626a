//! Verifier configuration.
//!
//! Defaults come from `SEEDCHECK_*` environment variables when set, the same
//! way the HTTP provider reads its endpoint. Builder setters override them.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Minimum number of all-passing seeds that flags a solution for review.
pub const DEFAULT_REVIEW_MIN_SEEDS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Maximum number of seeds executed concurrently.
    pub max_concurrency: usize,
    /// Deadline for one executor call; 0 disables the deadline.
    pub per_seed_timeout_ms: u64,
    /// All-pass runs over at least this many seeds get `needs_review`.
    pub review_min_seeds: usize,
    /// Maximum number of concurrent dataset fetches.
    pub fetch_concurrency: usize,
    /// Entries kept in the dataset cache; 0 disables caching.
    pub dataset_cache_capacity: usize,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for VerifierConfig {
    fn default() -> Self {
        VerifierConfig {
            max_concurrency: env_or::<usize>("SEEDCHECK_MAX_CONCURRENCY", 4).max(1),
            per_seed_timeout_ms: env_or("SEEDCHECK_SEED_TIMEOUT_MS", 120_000),
            review_min_seeds: env_or("SEEDCHECK_REVIEW_MIN_SEEDS", DEFAULT_REVIEW_MIN_SEEDS),
            fetch_concurrency: env_or::<usize>("SEEDCHECK_FETCH_CONCURRENCY", 4).max(1),
            dataset_cache_capacity: env_or("SEEDCHECK_DATASET_CACHE", 256),
        }
    }
}

impl VerifierConfig {
    /// Configuration from environment variables.
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n.max(1);
        self
    }

    pub fn with_per_seed_timeout(mut self, timeout: Duration) -> Self {
        self.per_seed_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_review_min_seeds(mut self, n: usize) -> Self {
        self.review_min_seeds = n;
        self
    }

    pub fn with_fetch_concurrency(mut self, n: usize) -> Self {
        self.fetch_concurrency = n.max(1);
        self
    }

    pub fn with_dataset_cache_capacity(mut self, n: usize) -> Self {
        self.dataset_cache_capacity = n;
        self
    }

    /// Per-seed deadline, `None` when disabled.
    pub fn per_seed_timeout(&self) -> Option<Duration> {
        (self.per_seed_timeout_ms > 0).then(|| Duration::from_millis(self.per_seed_timeout_ms))
    }
}
