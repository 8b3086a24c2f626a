//! Criteria matching, leaves first.
//!
//! - [`evaluate`]: one value against one expectation
//! - [`criteria`]: one record against a bundle (AND across fields)
//! - [`event_test`]: one test against a log (OR across instances)

pub mod criteria;
pub mod evaluate;

pub use criteria::{all_fields, CriteriaMatcher, TokenResolver, TokenResolvers, WEB_AGENT_ID_TOKEN};
pub use evaluate::{evaluate, evaluate_criterion};
pub use event_test::{any_instance, resolve_aliases, EvaluationMode, EventTestMatcher, TestScore};
