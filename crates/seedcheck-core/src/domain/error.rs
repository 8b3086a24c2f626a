//! Error taxonomy for verification calls.
//!
//! Only input problems abort a call. Per-unit failures (one action, one seed,
//! one dataset) are captured into the report instead of propagating.

/// Violations of a criterion's shape invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CriteriaError {
    #[error("operator {operator} requires a list value, got {found}")]
    ListRequired { operator: String, found: String },

    #[error("operator {operator} requires a scalar value, got {found}")]
    ScalarRequired { operator: String, found: String },

    #[error("criteria for field {field}: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<CriteriaError>,
    },
}

/// Failure reported by an [`Executor`](crate::seed_verify::Executor) for one seed.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("execution failed: {0}")]
    Failed(String),

    #[error("execution timed out after {limit_ms} ms")]
    Timeout { limit_ms: u64 },

    #[error("executor task aborted: {0}")]
    Aborted(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure reported by a [`DataProvider`](crate::diversity::DataProvider) for one seed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("dataset for project {project} seed {seed} is empty")]
    Empty { project: String, seed: i64 },

    #[error("dataset fetch failed: {0}")]
    Fetch(String),

    #[error("dataset is not valid JSON: {0}")]
    Decode(String),
}

/// Errors that abort a whole verification call.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid criteria: {0}")]
    Criteria(#[from] CriteriaError),
}

impl VerifyError {
    pub(crate) fn input(msg: impl Into<String>) -> Self {
        VerifyError::Input(msg.into())
    }
}

/// Result type for verification operations.
pub type Result<T> = std::result::Result<T, VerifyError>;
