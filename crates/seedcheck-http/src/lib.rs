//! Seedcheck HTTP data provider
//!
//! Serves seeded datasets to the diversity verifier from the application's
//! data service over HTTP.

pub mod error;
pub mod provider;

pub use error::{HttpProviderError, Result};
pub use provider::{HttpDataProvider, HttpProviderConfig, PROJECT_PLACEHOLDER};
