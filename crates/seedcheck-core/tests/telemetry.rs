//! Host-side tracing setup.

use std::sync::Arc;

use seedcheck_core::fakes::MemoryDataProvider;
use seedcheck_core::{init_tracing_from_env, DatasetDiversityVerifier};
use serde_json::json;
use tracing::Level;

#[tokio::test]
async fn host_installs_subscriber_once_then_verifies() {
    assert!(init_tracing_from_env(Level::DEBUG));
    assert!(!init_tracing_from_env(Level::INFO));

    let provider = MemoryDataProvider::new()
        .with_dataset("shop", 1, json!({"products": [{"name": "boots"}]}))
        .with_dataset("shop", 2, json!({"products": [{"name": "clogs"}]}));
    let verifier = DatasetDiversityVerifier::new(Arc::new(provider), "shop");
    let report = verifier.verify(&[1, 2]).await.expect("verify");
    assert!(report.passed);
}
