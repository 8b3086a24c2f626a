//! Dataset diversity across seeds.

use std::sync::Arc;

use seedcheck_core::fakes::MemoryDataProvider;
use seedcheck_core::{DatasetCache, DatasetDiversityVerifier, VerifierConfig, VerifyError};
use serde_json::{json, Value};

fn dataset(products: &[&str]) -> Value {
    json!({
        "products": products.iter().map(|p| json!({"name": p})).collect::<Vec<_>>(),
        "users": [{"id": 1}],
        "settings": {"currency": "USD"}
    })
}

#[tokio::test]
async fn distinct_datasets_pass() {
    let provider = MemoryDataProvider::new()
        .with_dataset("shop", 1, dataset(&["boots"]))
        .with_dataset("shop", 2, dataset(&["sandals", "heels"]))
        .with_dataset("shop", 3, dataset(&["clogs"]));
    let verifier = DatasetDiversityVerifier::new(Arc::new(provider), "shop");

    let report = verifier.verify(&[1, 2, 3]).await.expect("verify");
    assert!(report.all_different);
    assert!(report.passed);
    assert_eq!(report.loaded_count, 3);
    assert_eq!(report.comparison_results.len(), 3);
    assert_eq!(report.datasets_info[&2].total_items, 3);
    assert_eq!(report.datasets_info[&2].entity_count, 2);
    assert_eq!(report.datasets_info[&2].entities, vec!["products", "users"]);
}

#[tokio::test]
async fn identical_datasets_fail() {
    // Same content, different key order: still identical once canonicalized.
    let provider = MemoryDataProvider::new()
        .with_dataset("shop", 1, json!({"products": [{"name": "a"}], "users": []}))
        .with_dataset("shop", 2, json!({"users": [], "products": [{"name": "a"}]}));
    let verifier = DatasetDiversityVerifier::new(Arc::new(provider), "shop");

    let report = verifier.verify(&[1, 2]).await.expect("verify");
    assert!(!report.all_different);
    assert!(!report.passed);
    assert_eq!(report.identical_pairs(), vec![(1, 2)]);
    let cmp = &report.comparison_results[0];
    assert_eq!(cmp.hash1, cmp.hash2);
    assert!(!cmp.entities_differ);
}

#[tokio::test]
async fn partial_load_fails_even_when_loaded_ones_differ() {
    let provider = MemoryDataProvider::new()
        .with_dataset("shop", 1, dataset(&["boots"]))
        .with_dataset("shop", 2, json!({}))
        .with_dataset("shop", 3, dataset(&["clogs"]));
    let verifier = DatasetDiversityVerifier::new(Arc::new(provider), "shop");

    let report = verifier.verify(&[1, 2, 3, 4]).await.expect("verify");
    assert_eq!(report.loaded_count, 2);
    assert_eq!(report.expected_count, 4);
    assert!(!report.all_different);
    assert!(!report.passed);
    assert_eq!(report.comparison_results.len(), 1);
    assert!(report.comparison_results[0].different);
    assert!(!report.datasets_info[&2].success);
    assert!(!report.datasets_info[&4].success);
    assert!(report.datasets_info[&4].hash.is_empty());
}

#[tokio::test]
async fn single_loaded_seed_passes_trivially() {
    let provider = MemoryDataProvider::new().with_dataset("shop", 8, dataset(&["boots"]));
    let verifier = DatasetDiversityVerifier::new(Arc::new(provider), "shop");
    let report = verifier.verify(&[8]).await.expect("verify");
    assert!(report.passed);
    assert!(report.comparison_results.is_empty());
}

#[tokio::test]
async fn empty_seed_list_is_rejected() {
    let verifier = DatasetDiversityVerifier::new(Arc::new(MemoryDataProvider::new()), "shop");
    assert!(matches!(
        verifier.verify(&[]).await,
        Err(VerifyError::Input(_))
    ));
}

#[tokio::test]
async fn shared_cache_avoids_refetching() {
    let provider = Arc::new(
        MemoryDataProvider::new()
            .with_dataset("shop", 1, dataset(&["boots"]))
            .with_dataset("shop", 2, dataset(&["clogs"])),
    );
    let cache = Arc::new(DatasetCache::new(16));
    let config = VerifierConfig::default().with_fetch_concurrency(2);

    let first = DatasetDiversityVerifier::with_config(provider.clone(), "shop", config.clone())
        .with_cache(cache.clone());
    first.verify(&[1, 2]).await.expect("verify");
    assert_eq!(provider.fetch_count(), 2);

    let second = DatasetDiversityVerifier::with_config(provider.clone(), "shop", config)
        .with_cache(cache.clone());
    let report = second.verify(&[2, 1]).await.expect("verify");
    assert!(report.passed);
    assert_eq!(provider.fetch_count(), 2);
    assert_eq!(cache.hits(), 2);
}

#[tokio::test]
async fn failed_fetches_are_not_cached() {
    let provider = Arc::new(MemoryDataProvider::new());
    let verifier = DatasetDiversityVerifier::new(provider.clone(), "shop");
    verifier.verify(&[1]).await.expect("verify");
    assert!(verifier.cache().is_empty());

    provider.insert("shop", 1, dataset(&["boots"]));
    let report = verifier.verify(&[1]).await.expect("verify");
    assert!(report.passed);
    assert_eq!(provider.fetch_count(), 2);
}

#[tokio::test]
async fn report_keeps_request_order() {
    let provider = MemoryDataProvider::new()
        .with_dataset("shop", 30, dataset(&["a"]))
        .with_dataset("shop", 10, dataset(&["b"]))
        .with_dataset("shop", 20, dataset(&["c"]));
    let verifier = DatasetDiversityVerifier::new(Arc::new(provider), "shop");
    let report = verifier.verify(&[30, 10, 20]).await.expect("verify");
    assert_eq!(report.seeds_tested, vec![30, 10, 20]);
    let pairs: Vec<(i64, i64)> = report
        .comparison_results
        .iter()
        .map(|c| (c.seed1, c.seed2))
        .collect();
    assert_eq!(pairs, vec![(30, 10), (30, 20), (10, 20)]);
}
