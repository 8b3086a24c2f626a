//! Per-unit results produced inside a verification call.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Scores within this distance of 1.0 count as a full pass.
pub const PASS_EPSILON: f64 = 1e-9;

/// Whether `score` is a full pass.
pub fn is_full_score(score: f64) -> bool {
    (score - 1.0).abs() < PASS_EPSILON
}

/// Result of running the candidate actions against one seeded task variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedOutcome {
    pub seed: i64,
    pub passed: bool,
    pub score: f64,
    pub tests_passed: usize,
    pub total_tests: usize,
    pub error: Option<String>,
}

impl SeedOutcome {
    /// Outcome from an executor result; `passed` is derived from the score.
    pub fn scored(seed: i64, score: f64, tests_passed: usize, total_tests: usize) -> Self {
        Self {
            seed,
            passed: is_full_score(score),
            score,
            tests_passed,
            total_tests,
            error: None,
        }
    }

    /// Outcome for a seed whose execution failed.
    pub fn failed(seed: i64, error: impl Into<String>) -> Self {
        Self {
            seed,
            passed: false,
            score: 0.0,
            tests_passed: 0,
            total_tests: 0,
            error: Some(error.into()),
        }
    }
}

/// Summary of one seed's dataset. Unloadable datasets keep `success = false`
/// and an empty hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetFingerprint {
    pub seed: i64,
    pub hash: String,
    pub entity_count: usize,
    pub item_count: usize,
    pub entity_names: BTreeSet<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DatasetFingerprint {
    pub fn unloaded(seed: i64, error: impl Into<String>) -> Self {
        Self {
            seed,
            hash: String::new(),
            entity_count: 0,
            item_count: 0,
            entity_names: BTreeSet::new(),
            success: false,
            error: Some(error.into()),
        }
    }
}
