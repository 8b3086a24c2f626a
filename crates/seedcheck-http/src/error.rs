//! Error types for seedcheck-http

use seedcheck_core::ProviderError;
use thiserror::Error;

/// Errors that can occur talking to the data service
#[derive(Error, Debug)]
pub enum HttpProviderError {
    /// Base URL or dataset path does not form a valid URL
    #[error("invalid dataset URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Project name is blank
    #[error("project name must not be blank")]
    BlankProject,

    /// Non-2xx response
    #[error("data service returned {status} for {url}")]
    Status { status: u16, url: String },

    /// Body was not JSON
    #[error("invalid dataset body: {0}")]
    Decode(String),

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for HttpProviderError {
    fn from(err: reqwest::Error) -> Self {
        HttpProviderError::Http(err.to_string())
    }
}

impl From<HttpProviderError> for ProviderError {
    fn from(err: HttpProviderError) -> Self {
        match err {
            HttpProviderError::Decode(msg) => ProviderError::Decode(msg),
            other => ProviderError::Fetch(other.to_string()),
        }
    }
}

/// Result type for seedcheck-http
pub type Result<T> = std::result::Result<T, HttpProviderError>;
