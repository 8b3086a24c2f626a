//! Structured events for the verification lifecycle.
//!
//! Every verification call runs inside a [`VerificationSpan`] carrying a
//! fresh verification id, so per-seed events can be correlated afterwards.

use tracing::{info, warn};
use uuid::Uuid;

/// Verification-scoped tracing span.
///
/// The span is attached to futures with `tracing::Instrument` rather than
/// entered, so it stays valid across `.await` points and worker threads.
pub struct VerificationSpan {
    id: Uuid,
    span: tracing::Span,
}

impl VerificationSpan {
    /// Create a span tagged with `kind` and a new verification id.
    pub fn new(kind: &'static str) -> Self {
        let id = Uuid::new_v4();
        let span = tracing::info_span!("seedcheck.verify", kind = kind, verification_id = %id);
        Self { id, span }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn span(&self) -> tracing::Span {
        self.span.clone()
    }
}

pub fn emit_verification_started(kind: &str, seeds: &[i64]) {
    info!(event = "verification.started", kind = %kind, seeds = ?seeds);
}

pub fn emit_seed_finished(seed: i64, score: f64, passed: bool, error: Option<&str>) {
    match error {
        Some(error) => warn!(event = "seed.failed", seed = seed, score = score, error = %error),
        None => info!(event = "seed.finished", seed = seed, score = score, passed = passed),
    }
}

pub fn emit_dataset_loaded(project: &str, seed: i64, success: bool, item_count: usize) {
    info!(
        event = "dataset.loaded",
        project = %project,
        seed = seed,
        success = success,
        item_count = item_count,
    );
}

pub fn emit_verification_finished(kind: &str, passed: bool, passed_count: usize, total: usize) {
    info!(
        event = "verification.finished",
        kind = %kind,
        passed = passed,
        passed_count = passed_count,
        total = total,
    );
}

/// Advisory signal: the outcome looks too uniform for a randomized task.
pub fn emit_review_flagged(kind: &str, reason: &str) {
    warn!(event = "review.flagged", kind = %kind, reason = %reason);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_get_distinct_ids() {
        let a = VerificationSpan::new("seeds");
        let b = VerificationSpan::new("diversity");
        assert_ne!(a.id(), b.id());
    }
}
