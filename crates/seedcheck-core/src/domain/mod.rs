//! Domain models for seedcheck.
//!
//! - `Criterion` / `Expectation` / `CriteriaBundle`: field-level expectations
//! - `EventRecord` / `Test` / `UseCase` / `TaskVariant`: what gets matched
//! - `Action` / `Selector`: canonical browser actions
//! - `SeedOutcome` / `DatasetFingerprint`: per-unit verification results

pub mod action;
pub mod criteria;
pub mod digest;
pub mod error;
pub mod event;
pub mod outcome;

pub use action::{Action, ActionKind, Selector, SelectorKind};
pub use criteria::{CriteriaBundle, Criterion, Expectation, Operator};
pub use error::{CriteriaError, ExecutorError, ProviderError, Result, VerifyError};
pub use event::{EventRecord, ReferenceTest, TaskVariant, Test, UseCase};
pub use outcome::{is_full_score, DatasetFingerprint, SeedOutcome, PASS_EPSILON};
