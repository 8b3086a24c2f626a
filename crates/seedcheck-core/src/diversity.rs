//! Checking that distinct seeds produce distinct datasets.
//!
//! Datasets are fetched per `(project, seed)` through a [`DataProvider`],
//! memoized in a bounded [`DatasetCache`] and reduced to a
//! [`DatasetFingerprint`]. Fingerprints of loaded datasets are compared
//! pairwise by content hash.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, instrument, Instrument};

use crate::config::VerifierConfig;
use crate::domain::digest::compute_digest;
use crate::domain::{DatasetFingerprint, ProviderError, Result, VerifyError};
use crate::metrics::METRICS;
use crate::obs::{self, VerificationSpan};
use crate::reporting::{diversity_report, ComparisonResult, DiversityReport, DiversityVerdict};
use crate::seed_url::distinct_seeds;

const KIND: &str = "diversity";

/// Source of seeded datasets.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// The dataset generated for `project` under `seed`.
    async fn fetch(&self, project: &str, seed: i64) -> std::result::Result<Value, ProviderError>;
}

type CacheKey = (String, i64);

struct CacheEntry {
    data: Arc<Value>,
    last_used: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    clock: u64,
}

impl CacheState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

/// Bounded least-recently-used cache of loaded datasets.
///
/// The first value stored for a key wins; later inserts for the same key
/// return the cached value. Capacity 0 disables caching entirely.
pub struct DatasetCache {
    capacity: usize,
    state: Mutex<CacheState>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DatasetCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, project: &str, seed: i64) -> Option<Arc<Value>> {
        if self.capacity == 0 {
            return None;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = state.tick();
        match state.entries.get_mut(&(project.to_string(), seed)) {
            Some(entry) => {
                entry.last_used = now;
                self.hits.fetch_add(1, Ordering::Relaxed);
                METRICS.inc_dataset_cache_hits();
                Some(Arc::clone(&entry.data))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store `data` unless the key is already cached, returning the cached value.
    pub fn insert(&self, project: &str, seed: i64, data: Value) -> Arc<Value> {
        if self.capacity == 0 {
            return Arc::new(data);
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = state.tick();
        let key = (project.to_string(), seed);
        if let Some(entry) = state.entries.get_mut(&key) {
            entry.last_used = now;
            return Arc::clone(&entry.data);
        }
        if state.entries.len() >= self.capacity {
            state.evict_lru();
        }
        let data = Arc::new(data);
        state.entries.insert(
            key,
            CacheEntry {
                data: Arc::clone(&data),
                last_used: now,
            },
        );
        data
    }

    pub fn contains(&self, project: &str, seed: i64) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.entries.contains_key(&(project.to_string(), seed))
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clear();
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new(VerifierConfig::default().dataset_cache_capacity)
    }
}

/// `null`, `{}` and `[]` count as no dataset at all.
pub fn is_empty_dataset(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Reduce a dataset to its content hash and entity summary.
///
/// Entities are the top-level keys holding arrays; their lengths sum to
/// `item_count`. Datasets that are not objects still hash but have no
/// entities.
pub fn fingerprint(seed: i64, data: &Value) -> DatasetFingerprint {
    if is_empty_dataset(data) {
        return DatasetFingerprint::unloaded(seed, "dataset is empty");
    }
    let hash = match compute_digest(data) {
        Ok(hash) => hash,
        Err(e) => return DatasetFingerprint::unloaded(seed, e.to_string()),
    };

    let mut entity_names = BTreeSet::new();
    let mut item_count = 0;
    if let Some(map) = data.as_object() {
        for (name, value) in map {
            if let Some(items) = value.as_array() {
                entity_names.insert(name.clone());
                item_count += items.len();
            }
        }
    }

    DatasetFingerprint {
        seed,
        hash,
        entity_count: entity_names.len(),
        item_count,
        entity_names,
        success: true,
        error: None,
    }
}

pub fn compare_datasets(a: &DatasetFingerprint, b: &DatasetFingerprint) -> ComparisonResult {
    ComparisonResult {
        seed1: a.seed,
        seed2: b.seed,
        different: a.hash != b.hash,
        hash1: a.hash.clone(),
        hash2: b.hash.clone(),
        entities_differ: a.entity_names != b.entity_names,
    }
}

/// Compare every pair of loaded fingerprints once, in request order.
pub fn compare_pairs(fingerprints: &[DatasetFingerprint]) -> Vec<ComparisonResult> {
    let loaded: Vec<&DatasetFingerprint> = fingerprints.iter().filter(|f| f.success).collect();
    let mut comparisons = Vec::new();
    for (i, a) in loaded.iter().enumerate() {
        for b in &loaded[i + 1..] {
            comparisons.push(compare_datasets(a, b));
        }
    }
    comparisons
}

/// A run passes only when every expected dataset loaded and no two match.
pub fn decide_diversity_verdict(
    fingerprints: &[DatasetFingerprint],
    comparisons: &[ComparisonResult],
    expected_count: usize,
) -> DiversityVerdict {
    let loaded_count = fingerprints.iter().filter(|f| f.success).count();
    let all_loaded = loaded_count == expected_count;
    let all_different = all_loaded && comparisons.iter().all(|c| c.different);
    DiversityVerdict {
        loaded_count,
        expected_count,
        all_different,
        passed: all_different && all_loaded,
    }
}

/// Checks that each seed of a project yields its own dataset.
pub struct DatasetDiversityVerifier {
    provider: Arc<dyn DataProvider>,
    project: String,
    cache: Arc<DatasetCache>,
    config: VerifierConfig,
}

impl DatasetDiversityVerifier {
    pub fn new(provider: Arc<dyn DataProvider>, project: impl Into<String>) -> Self {
        Self::with_config(provider, project, VerifierConfig::default())
    }

    pub fn with_config(
        provider: Arc<dyn DataProvider>,
        project: impl Into<String>,
        config: VerifierConfig,
    ) -> Self {
        let cache = Arc::new(DatasetCache::new(config.dataset_cache_capacity));
        Self {
            provider,
            project: project.into(),
            cache,
            config,
        }
    }

    /// Share a cache across verifiers, e.g. one per process.
    pub fn with_cache(mut self, cache: Arc<DatasetCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn cache(&self) -> &Arc<DatasetCache> {
        &self.cache
    }

    /// Load every seed's dataset and compare them pairwise.
    ///
    /// Only an empty seed list is an error; fetch failures show up as
    /// unloaded entries and fail the report.
    pub async fn verify(&self, seeds: &[i64]) -> Result<DiversityReport> {
        let scope = VerificationSpan::new(KIND);
        self.run(seeds).instrument(scope.span()).await
    }

    #[instrument(skip_all, fields(project = %self.project, seeds = seeds.len()))]
    async fn run(&self, seeds: &[i64]) -> Result<DiversityReport> {
        if seeds.is_empty() {
            return Err(VerifyError::input("at least one seed is required"));
        }
        let seeds = distinct_seeds(seeds);
        obs::emit_verification_started(KIND, &seeds);

        let fingerprints: Vec<DatasetFingerprint> = stream::iter(seeds.iter().copied())
            .map(|seed| self.load(seed))
            .buffered(self.config.fetch_concurrency.max(1))
            .collect()
            .await;

        let comparisons = compare_pairs(&fingerprints);
        let verdict = decide_diversity_verdict(&fingerprints, &comparisons, seeds.len());
        let report = diversity_report(seeds, &fingerprints, comparisons, verdict);
        if !report.identical_pairs().is_empty() {
            obs::emit_review_flagged(KIND, &report.summary);
        }
        obs::emit_verification_finished(
            KIND,
            report.passed,
            report.loaded_count,
            report.expected_count,
        );
        METRICS.flush();
        Ok(report)
    }

    async fn load(&self, seed: i64) -> DatasetFingerprint {
        let fp = match self.dataset(seed).await {
            Ok(data) => fingerprint(seed, &data),
            Err(e) => {
                debug!(seed, error = %e, "dataset unavailable");
                DatasetFingerprint::unloaded(seed, e.to_string())
            }
        };
        obs::emit_dataset_loaded(&self.project, seed, fp.success, fp.item_count);
        fp
    }

    async fn dataset(&self, seed: i64) -> std::result::Result<Arc<Value>, ProviderError> {
        if let Some(hit) = self.cache.get(&self.project, seed) {
            return Ok(hit);
        }
        METRICS.inc_datasets_fetched();
        let data = self.provider.fetch(&self.project, seed).await?;
        if is_empty_dataset(&data) {
            return Err(ProviderError::Empty {
                project: self.project.clone(),
                seed,
            });
        }
        Ok(self.cache.insert(&self.project, seed, data))
    }
}
