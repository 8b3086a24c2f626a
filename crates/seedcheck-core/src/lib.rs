//! Seedcheck Core Library
//!
//! Verification engine for web-agent benchmark tasks: criteria matching over
//! backend event logs, canonical action normalization, seed re-execution and
//! dataset diversity checks.
//!
//! The library only emits `tracing` events and never installs a subscriber.
//! Hosts that want the stock output call [`init_tracing_from_env`] once at
//! startup, before the first verification:
//!
//! ```rust,ignore
//! seedcheck_core::init_tracing_from_env(tracing::Level::INFO);
//! ```

pub mod config;
pub mod diversity;
pub mod domain;
pub mod fakes;
pub mod matcher;
pub mod metrics;
pub mod normalize;
pub mod obs;
pub mod reporting;
pub mod seed_url;
pub mod seed_verify;
pub mod telemetry;

pub use config::{VerifierConfig, DEFAULT_REVIEW_MIN_SEEDS};

pub use domain::{
    is_full_score, Action, ActionKind, CriteriaBundle, CriteriaError, Criterion,
    DatasetFingerprint, EventRecord, ExecutorError, Expectation, Operator, ProviderError,
    ReferenceTest, Result, SeedOutcome, Selector, SelectorKind, TaskVariant, Test, UseCase,
    VerifyError, PASS_EPSILON,
};

pub use matcher::{
    evaluate, evaluate_criterion, CriteriaMatcher, EvaluationMode, EventTestMatcher, TestScore,
    TokenResolvers,
};

pub use normalize::{normalize_action, normalize_actions, try_normalize_action, DropReason};

pub use seed_url::{extract_seed, with_seed, SEED_PARAM};

pub use seed_verify::{
    decide_seed_verdict, seeded_actions, ExecutionResult, Executor, SeedReexecutionVerifier, SeedVerificationRequest,
};

pub use diversity::{
    compare_datasets, compare_pairs, decide_diversity_verdict, fingerprint, DataProvider,
    DatasetCache, DatasetDiversityVerifier,
};

pub use reporting::{
    ComparisonResult, DatasetInfo, DiversityReport, DiversityVerdict, SeedReport, SeedVerdict,
};

pub use telemetry::{init_tracing, init_tracing_from_env};

/// Crate version, as published.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
