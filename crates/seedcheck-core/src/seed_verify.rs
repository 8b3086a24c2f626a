//! Re-executing one candidate solution across seeded task variants.
//!
//! The candidate actions are normalized once and shared read-only. Each seed
//! gets its own task variant (start URL and every navigation target rewritten
//! to carry the seed) and its own executor call on a tokio task. A failing,
//! hanging or panicking seed only affects its own outcome.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn, Instrument};

use crate::config::VerifierConfig;
use crate::domain::{
    Action, ExecutorError, ReferenceTest, Result, SeedOutcome, TaskVariant, Test, UseCase,
    VerifyError,
};
use crate::metrics::METRICS;
use crate::normalize::normalize_actions;
use crate::obs::{self, VerificationSpan};
use crate::reporting::{seed_report, SeedReport, SeedVerdict};
use crate::seed_url::{distinct_seeds, with_seed};

const KIND: &str = "seeds";

/// What an executor reports after running actions against one task variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub score: f64,
    pub tests_passed: usize,
    pub total_tests: usize,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn new(score: f64, tests_passed: usize, total_tests: usize) -> Self {
        Self {
            score,
            tests_passed,
            total_tests,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Runs an action sequence against a live task variant and scores it.
///
/// Implementations drive a real browser in production; see
/// [`crate::fakes`] for deterministic test doubles.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(
        &self,
        task: &TaskVariant,
        actions: &[Action],
    ) -> std::result::Result<ExecutionResult, ExecutorError>;
}

/// Input to [`SeedReexecutionVerifier::verify`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedVerificationRequest {
    pub reference_prompt: String,
    #[serde(default)]
    pub reference_tests: Vec<ReferenceTest>,
    pub reference_start_url: String,
    #[serde(default)]
    pub use_case: Option<UseCase>,
    #[serde(default)]
    pub seeds: Vec<i64>,
    /// Raw action payloads as produced by the agent.
    #[serde(default)]
    pub candidate_actions: Option<Vec<Value>>,
}

impl SeedVerificationRequest {
    pub fn new(prompt: impl Into<String>, start_url: impl Into<String>) -> Self {
        Self {
            reference_prompt: prompt.into(),
            reference_start_url: start_url.into(),
            ..Self::default()
        }
    }

    pub fn with_test(mut self, test: impl Into<ReferenceTest>) -> Self {
        self.reference_tests.push(test.into());
        self
    }

    pub fn with_use_case(mut self, use_case: UseCase) -> Self {
        self.use_case = Some(use_case);
        self
    }

    pub fn with_seeds(mut self, seeds: impl IntoIterator<Item = i64>) -> Self {
        self.seeds = seeds.into_iter().collect();
        self
    }

    pub fn with_candidate_actions(mut self, actions: Vec<Value>) -> Self {
        self.candidate_actions = Some(actions);
        self
    }
}

/// The seed-independent part of every task variant.
struct TaskTemplate {
    prompt: String,
    start_url: String,
    tests: Vec<Test>,
    use_case: UseCase,
}

impl TaskTemplate {
    fn variant(&self, seed: i64) -> TaskVariant {
        TaskVariant {
            seed,
            prompt: self.prompt.clone(),
            url: with_seed(&self.start_url, seed),
            tests: self.tests.clone(),
            use_case: self.use_case.clone(),
        }
    }
}

/// Copy of `actions` with every navigation target pinned to `seed`.
///
/// History navigation (back/forward) carries no URL and is left as is.
pub fn seeded_actions(actions: &[Action], seed: i64) -> Vec<Action> {
    actions
        .iter()
        .map(|action| match action {
            Action::Navigate {
                selector,
                url: Some(url),
                go_back,
                go_forward,
            } => Action::Navigate {
                selector: selector.clone(),
                url: Some(with_seed(url, seed)),
                go_back: *go_back,
                go_forward: *go_forward,
            },
            other => other.clone(),
        })
        .collect()
}

/// Aggregate decision over per-seed outcomes.
///
/// A run needs review when every one of at least `review_min_seeds` seeds
/// passed: a fixed action sequence should not succeed on every variant of a
/// seed-dependent task.
pub fn decide_seed_verdict(
    outcomes: &[SeedOutcome],
    total_count: usize,
    review_min_seeds: usize,
) -> SeedVerdict {
    let passed_count = outcomes.iter().filter(|o| o.passed).count();
    let all_passed = total_count > 0 && passed_count == total_count;
    SeedVerdict {
        passed_count,
        total_count,
        all_passed,
        needs_review: all_passed && total_count >= review_min_seeds,
    }
}

/// Checks that a fixed solution generalizes across seeds.
pub struct SeedReexecutionVerifier {
    executor: Arc<dyn Executor>,
    config: VerifierConfig,
}

impl SeedReexecutionVerifier {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self::with_config(executor, VerifierConfig::default())
    }

    pub fn with_config(executor: Arc<dyn Executor>, config: VerifierConfig) -> Self {
        Self { executor, config }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Run the candidate actions against every requested seed.
    ///
    /// Returns `VerifyError::Input` when the actions, use case or seeds are
    /// missing, when a reference test carries malformed criteria, or when
    /// no candidate action survives normalization. Per-seed failures are
    /// reported in the [`SeedReport`] instead.
    pub async fn verify(&self, request: &SeedVerificationRequest) -> Result<SeedReport> {
        let scope = VerificationSpan::new(KIND);
        self.run(request).instrument(scope.span()).await
    }

    #[instrument(skip_all, fields(seeds = request.seeds.len()))]
    async fn run(&self, request: &SeedVerificationRequest) -> Result<SeedReport> {
        let raw = request
            .candidate_actions
            .as_deref()
            .filter(|actions| !actions.is_empty())
            .ok_or_else(|| VerifyError::input("candidate actions are required"))?;
        let use_case = request
            .use_case
            .as_ref()
            .ok_or_else(|| VerifyError::input("a use case is required"))?;
        if request.seeds.is_empty() {
            return Err(VerifyError::input("at least one seed is required"));
        }
        for test in &request.reference_tests {
            test.criteria.validate()?;
        }

        let actions = normalize_actions(raw);
        if actions.is_empty() {
            return Err(VerifyError::input(format!(
                "none of the {} candidate actions could be normalized",
                raw.len()
            )));
        }
        debug!(raw = raw.len(), kept = actions.len(), "normalized candidate actions");

        let seeds = distinct_seeds(&request.seeds);
        obs::emit_verification_started(KIND, &seeds);

        let template = Arc::new(TaskTemplate {
            prompt: request.reference_prompt.clone(),
            start_url: request.reference_start_url.clone(),
            tests: request
                .reference_tests
                .iter()
                .map(|t| t.resolve(use_case))
                .collect(),
            use_case: use_case.clone(),
        });
        let actions = Arc::new(actions);
        let sem = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let timeout = self.config.per_seed_timeout();

        // Dropping the set aborts every seed still queued or running, so a
        // caller-side deadline around `verify` stops further executor calls.
        let mut join_set = JoinSet::new();
        for (idx, &seed) in seeds.iter().enumerate() {
            let executor = Arc::clone(&self.executor);
            let template = Arc::clone(&template);
            let actions = Arc::clone(&actions);
            let sem = Arc::clone(&sem);

            join_set.spawn(
                async move {
                    let _permit = sem.acquire_owned().await.ok();
                    let run = run_seed(executor.as_ref(), &template, &actions, seed, timeout);
                    let outcome = AssertUnwindSafe(run)
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| aborted_outcome(seed, &panic_message(&*panic)));
                    (idx, outcome)
                }
                .in_current_span(),
            );
        }

        let mut slots: Vec<Option<SeedOutcome>> = vec![None; seeds.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, outcome)) => slots[idx] = Some(outcome),
                Err(e) => warn!(error = %e, "seed task join error"),
            }
        }
        let outcomes: Vec<SeedOutcome> = seeds
            .iter()
            .zip(slots)
            .map(|(&seed, slot)| {
                slot.unwrap_or_else(|| aborted_outcome(seed, "seed task did not complete"))
            })
            .collect();

        let verdict = decide_seed_verdict(&outcomes, seeds.len(), self.config.review_min_seeds);
        let report = seed_report(seeds, outcomes, verdict);
        if report.needs_review {
            obs::emit_review_flagged(KIND, &report.summary);
        }
        obs::emit_verification_finished(
            KIND,
            report.all_passed,
            report.passed_count,
            report.total_count,
        );
        METRICS.flush();
        Ok(report)
    }
}

fn aborted_outcome(seed: i64, detail: &str) -> SeedOutcome {
    METRICS.inc_seed_failures();
    let err = ExecutorError::Aborted(detail.to_string()).to_string();
    obs::emit_seed_finished(seed, 0.0, false, Some(&err));
    SeedOutcome::failed(seed, err)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "executor panicked".to_string())
}

async fn run_seed(
    executor: &dyn Executor,
    template: &TaskTemplate,
    actions: &[Action],
    seed: i64,
    timeout: Option<Duration>,
) -> SeedOutcome {
    let task = template.variant(seed);
    let actions = seeded_actions(actions, seed);
    debug!(seed, url = %task.url, actions = actions.len(), "executing seed");

    let call = executor.execute(&task, &actions);
    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
            Err(ExecutorError::Timeout {
                limit_ms: limit.as_millis() as u64,
            })
        }),
        None => call.await,
    };
    METRICS.inc_seeds_executed();

    let outcome = match result {
        Ok(result) => SeedOutcome {
            error: result.error,
            ..SeedOutcome::scored(seed, result.score, result.tests_passed, result.total_tests)
        },
        Err(err) => {
            METRICS.inc_seed_failures();
            SeedOutcome::failed(seed, err.to_string())
        }
    };
    obs::emit_seed_finished(seed, outcome.score, outcome.passed, outcome.error.as_deref());
    outcome
}
