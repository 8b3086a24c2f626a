//! Data service client
//!
//! Fetches seeded datasets with `GET {base_url}{dataset_path}?seed=N`, where
//! `{project}` in the dataset path is replaced by the project name.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use seedcheck_core::diversity::{is_empty_dataset, DataProvider};
use seedcheck_core::{with_seed, ProviderError};

use crate::error::{HttpProviderError, Result};

/// Placeholder replaced by the project name in `dataset_path`.
pub const PROJECT_PLACEHOLDER: &str = "{project}";

/// Data service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpProviderConfig {
    /// Data service root, e.g. `http://localhost:8090`
    pub base_url: String,
    /// Path template appended to `base_url`
    pub dataset_path: String,
    /// Per-request timeout; 0 disables it
    pub timeout_ms: u64,
}

impl Default for HttpProviderConfig {
    fn default() -> Self {
        HttpProviderConfig {
            base_url: std::env::var("SEEDCHECK_DATA_URL")
                .unwrap_or_else(|_| "http://localhost:8090".to_string()),
            dataset_path: std::env::var("SEEDCHECK_DATA_PATH")
                .unwrap_or_else(|_| "/datasets/{project}".to_string()),
            timeout_ms: std::env::var("SEEDCHECK_DATA_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(30_000),
        }
    }
}

impl HttpProviderConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Config for a specific data service
    pub fn new(base_url: &str) -> Self {
        HttpProviderConfig {
            base_url: base_url.to_string(),
            dataset_path: "/datasets/{project}".to_string(),
            timeout_ms: 30_000,
        }
    }

    pub fn with_dataset_path(mut self, path: &str) -> Self {
        self.dataset_path = path.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// The dataset URL for `project` under `seed`.
    pub fn dataset_url(&self, project: &str, seed: i64) -> Result<Url> {
        let project = project.trim();
        if project.is_empty() {
            return Err(HttpProviderError::BlankProject);
        }
        let path = self.dataset_path.replace(PROJECT_PLACEHOLDER, project);
        let joined = match (self.base_url.ends_with('/'), path.starts_with('/')) {
            (true, true) => format!("{}{}", self.base_url.trim_end_matches('/'), path),
            (false, false) if !path.is_empty() => format!("{}/{}", self.base_url, path),
            _ => format!("{}{}", self.base_url, path),
        };
        let raw = with_seed(&joined, seed);
        Url::parse(&raw).map_err(|e| HttpProviderError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })
    }
}

/// [`DataProvider`] backed by the application's data service.
pub struct HttpDataProvider {
    config: HttpProviderConfig,
    http_client: reqwest::Client,
}

impl HttpDataProvider {
    pub fn new(config: HttpProviderConfig) -> Result<Self> {
        let mut builder =
            reqwest::Client::builder().user_agent(concat!("seedcheck-http/", env!("CARGO_PKG_VERSION")));
        if config.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.timeout_ms));
        }
        Ok(HttpDataProvider {
            config,
            http_client: builder.build()?,
        })
    }

    /// Create a provider from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(HttpProviderConfig::from_env())
    }

    pub fn config(&self) -> &HttpProviderConfig {
        &self.config
    }

    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    async fn fetch_dataset(&self, project: &str, seed: i64) -> Result<Value> {
        let url = self.config.dataset_url(project, seed)?;
        debug!(url = %url, "fetching dataset");

        let response = self.http_client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "data service rejected request");
            return Err(HttpProviderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        decode_body(&body)
            .with_context(|| format!("dataset for {project} seed {seed} from {url}"))
            .map_err(|e| HttpProviderError::Decode(format!("{e:#}")))
    }
}

fn decode_body(body: &[u8]) -> anyhow::Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).context("body is not valid JSON")
}

#[async_trait]
impl DataProvider for HttpDataProvider {
    async fn fetch(&self, project: &str, seed: i64) -> std::result::Result<Value, ProviderError> {
        let data = self.fetch_dataset(project, seed).await?;
        if is_empty_dataset(&data) {
            return Err(ProviderError::Empty {
                project: project.to_string(),
                seed,
            });
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_url_substitutes_project_and_seed() {
        let config = HttpProviderConfig::new("http://data.local:8090");
        let url = config.dataset_url("autocinema", 42).expect("url");
        assert_eq!(url.as_str(), "http://data.local:8090/datasets/autocinema?seed=42");
    }

    #[test]
    fn test_dataset_url_joins_slashes_once() {
        let config = HttpProviderConfig::new("http://data.local/").with_dataset_path("/v1/{project}/data");
        assert_eq!(
            config.dataset_url("shop", 1).expect("url").as_str(),
            "http://data.local/v1/shop/data?seed=1"
        );

        let config = HttpProviderConfig::new("http://data.local").with_dataset_path("v1/{project}");
        assert_eq!(
            config.dataset_url("shop", 1).expect("url").as_str(),
            "http://data.local/v1/shop?seed=1"
        );
    }

    #[test]
    fn test_existing_seed_in_template_is_overwritten() {
        let config =
            HttpProviderConfig::new("http://data.local").with_dataset_path("/{project}?seed=0&fmt=json");
        assert_eq!(
            config.dataset_url("shop", 9).expect("url").as_str(),
            "http://data.local/shop?seed=9&fmt=json"
        );
    }

    #[test]
    fn test_blank_project_rejected() {
        let config = HttpProviderConfig::new("http://data.local");
        assert!(matches!(
            config.dataset_url("  ", 1),
            Err(HttpProviderError::BlankProject)
        ));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = HttpProviderConfig::new("not a url");
        assert!(matches!(
            config.dataset_url("shop", 1),
            Err(HttpProviderError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(b"  \n").expect("blank"), Value::Null);
        assert_eq!(
            decode_body(br#"{"products": []}"#).expect("json"),
            serde_json::json!({"products": []})
        );
        assert!(decode_body(b"<html>").is_err());
    }
}
