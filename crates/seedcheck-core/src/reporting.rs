//! Report assembly for both verifiers.
//!
//! The verifiers decide the aggregate flags; this module only turns those
//! flags and the per-unit results into a serializable report with a
//! human-readable summary. The wire shapes use camelCase field names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{DatasetFingerprint, SeedOutcome};

/// Outcome of running one candidate solution across several seeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub seeds_tested: Vec<i64>,
    pub results: BTreeMap<i64, SeedOutcome>,
    pub all_passed: bool,
    pub passed_count: usize,
    pub total_count: usize,
    pub summary: String,
    /// Advisory: a fixed action sequence passed every seed of a task that
    /// is supposed to vary with the seed.
    pub needs_review: bool,
}

impl SeedReport {
    /// Seeds whose outcome did not pass, in ascending order.
    pub fn failed_seeds(&self) -> Vec<i64> {
        self.results
            .values()
            .filter(|o| !o.passed)
            .map(|o| o.seed)
            .collect()
    }
}

/// Aggregate flags for a seed run, decided by the seed verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedVerdict {
    pub passed_count: usize,
    pub total_count: usize,
    pub all_passed: bool,
    pub needs_review: bool,
}

/// Assemble a seed report.
///
/// `seeds` is the tested seed list in request order.
pub fn seed_report(seeds: Vec<i64>, outcomes: Vec<SeedOutcome>, verdict: SeedVerdict) -> SeedReport {
    SeedReport {
        summary: seed_summary(verdict.passed_count, verdict.total_count, verdict.needs_review),
        seeds_tested: seeds,
        results: outcomes.into_iter().map(|o| (o.seed, o)).collect(),
        all_passed: verdict.all_passed,
        passed_count: verdict.passed_count,
        total_count: verdict.total_count,
        needs_review: verdict.needs_review,
    }
}

fn seed_summary(passed: usize, total: usize, needs_review: bool) -> String {
    let mut summary = if passed == total {
        format!("All {total} seeds passed")
    } else {
        format!("{passed}/{total} seeds passed")
    };
    if needs_review {
        summary.push_str(
            "; the same action sequence passed every seed, so the task may not depend on the seed",
        );
    }
    summary
}

/// Per-seed dataset summary as reported on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfo {
    pub success: bool,
    pub hash: String,
    pub entity_count: usize,
    pub total_items: usize,
    pub entities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&DatasetFingerprint> for DatasetInfo {
    fn from(fp: &DatasetFingerprint) -> Self {
        Self {
            success: fp.success,
            hash: fp.hash.clone(),
            entity_count: fp.entity_count,
            total_items: fp.item_count,
            entities: fp.entity_names.iter().cloned().collect(),
            error: fp.error.clone(),
        }
    }
}

/// Comparison of two loaded datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub seed1: i64,
    pub seed2: i64,
    pub different: bool,
    pub hash1: String,
    pub hash2: String,
    pub entities_differ: bool,
}

/// Whether distinct seeds produced distinct datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiversityReport {
    pub seeds_tested: Vec<i64>,
    pub all_different: bool,
    pub datasets_info: BTreeMap<i64, DatasetInfo>,
    pub comparison_results: Vec<ComparisonResult>,
    pub passed: bool,
    pub summary: String,
    pub loaded_count: usize,
    pub expected_count: usize,
}

impl DiversityReport {
    /// Pairs of seeds whose datasets hash identically.
    pub fn identical_pairs(&self) -> Vec<(i64, i64)> {
        self.comparison_results
            .iter()
            .filter(|c| !c.different)
            .map(|c| (c.seed1, c.seed2))
            .collect()
    }
}

/// Aggregate flags for a diversity run, decided by the diversity verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiversityVerdict {
    pub loaded_count: usize,
    pub expected_count: usize,
    pub all_different: bool,
    pub passed: bool,
}

/// Assemble a diversity report.
///
/// `fingerprints` must be in request order.
pub fn diversity_report(
    seeds: Vec<i64>,
    fingerprints: &[DatasetFingerprint],
    comparison_results: Vec<ComparisonResult>,
    verdict: DiversityVerdict,
) -> DiversityReport {
    let DiversityVerdict {
        loaded_count,
        expected_count,
        ..
    } = verdict;
    let identical = comparison_results.iter().filter(|c| !c.different).count();
    let summary = if loaded_count < expected_count {
        format!("Only {loaded_count}/{expected_count} datasets loaded")
    } else if identical > 0 {
        format!(
            "{identical} of {} seed pairs produced identical datasets",
            comparison_results.len()
        )
    } else {
        format!("All {expected_count} datasets are distinct")
    };

    DiversityReport {
        seeds_tested: seeds,
        all_different: verdict.all_different,
        datasets_info: fingerprints.iter().map(|f| (f.seed, DatasetInfo::from(f))).collect(),
        comparison_results,
        passed: verdict.passed,
        summary,
        loaded_count,
        expected_count,
    }
}
