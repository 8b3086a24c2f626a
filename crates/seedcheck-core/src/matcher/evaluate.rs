//! Single-value evaluation against one expectation.
//!
//! No branch fails: type mismatches, nulls and malformed criteria all
//! evaluate to `false` so that one bad criterion cannot abort a larger match.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::domain::criteria::{Criterion, Expectation, Operator};

/// Evaluate `actual` against `expectation`.
///
/// Bare values keep the legacy semantics (case-insensitive substring for two
/// strings), which is looser than an explicit `equals`.
pub fn evaluate(actual: &Value, expectation: &Expectation) -> bool {
    match expectation {
        Expectation::Wildcard => true,
        Expectation::Bare(expected) => match (actual, expected) {
            (Value::String(a), Value::String(e)) => contains_ci(a, e),
            _ => values_equal(actual, expected),
        },
        Expectation::Rule(criterion) => evaluate_criterion(actual, criterion),
    }
}

/// Evaluate `actual` against an explicit operator rule.
pub fn evaluate_criterion(actual: &Value, criterion: &Criterion) -> bool {
    let expected = &criterion.value;
    match criterion.operator {
        Operator::Equals => equals(actual, expected),
        Operator::NotEquals => !equals(actual, expected),
        Operator::Contains => match (actual, expected) {
            (Value::String(a), Value::String(e)) => contains_ci(a, e),
            _ => false,
        },
        Operator::NotContains => match (actual, expected) {
            (Value::String(a), Value::String(e)) => !contains_ci(a, e),
            _ => false,
        },
        Operator::GreaterThan => compare(actual, expected) == Some(Ordering::Greater),
        Operator::LessThan => compare(actual, expected) == Some(Ordering::Less),
        Operator::GreaterEqual => matches!(
            compare(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::LessEqual => matches!(
            compare(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::InList => in_list(actual, expected).unwrap_or(false),
        Operator::NotInList => in_list(actual, expected).map(|hit| !hit).unwrap_or(false),
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::String(a), Value::String(e)) => a.to_lowercase() == e.to_lowercase(),
        _ => values_equal(actual, expected),
    }
}

/// Native equality; numbers compare by value so `1 == 1.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => x == y,
            },
        },
        _ => a == b,
    }
}

/// `Some(hit)` when membership is decidable, `None` for null actual or a
/// non-list criterion value.
fn in_list(actual: &Value, expected: &Value) -> Option<bool> {
    if actual.is_null() {
        return None;
    }
    let candidates = expected.as_array()?;
    Some(candidates.iter().any(|candidate| equals(actual, candidate)))
}

fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(a), Value::String(b)) => match (parse_datetime(a), parse_datetime(b)) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => Some(a.as_str().cmp(b.as_str())),
        },
        _ => None,
    }
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(value: Value, operator: Operator) -> Expectation {
        Expectation::Rule(Criterion::new(value, operator))
    }

    #[test]
    fn test_wildcard_matches_anything() {
        assert!(evaluate(&Value::Null, &Expectation::Wildcard));
        assert!(evaluate(&json!(42), &Expectation::Wildcard));
    }

    #[test]
    fn test_equals_is_case_insensitive_exact() {
        assert!(evaluate(&json!("Active"), &rule(json!("active"), Operator::Equals)));
        assert!(!evaluate(&json!("Active"), &rule(json!("Inactive"), Operator::Equals)));
        assert!(!evaluate(&json!("Active user"), &rule(json!("active"), Operator::Equals)));
    }

    #[test]
    fn test_bare_string_is_substring() {
        let bare = Expectation::Bare(json!("active"));
        assert!(evaluate(&json!("Active user"), &bare));
        assert!(evaluate(&json!("INACTIVE"), &bare));
        assert!(!evaluate(&json!("pending"), &bare));
    }

    #[test]
    fn test_bare_non_string_is_equality() {
        assert!(evaluate(&json!(3), &Expectation::Bare(json!(3))));
        assert!(evaluate(&json!(3.0), &Expectation::Bare(json!(3))));
        assert!(!evaluate(&json!("3"), &Expectation::Bare(json!(3))));
        assert!(evaluate(&json!(true), &Expectation::Bare(json!(true))));
    }

    #[test]
    fn test_not_equals_negates() {
        assert!(evaluate(&json!("a"), &rule(json!("b"), Operator::NotEquals)));
        assert!(!evaluate(&json!("A"), &rule(json!("a"), Operator::NotEquals)));
        assert!(evaluate(&Value::Null, &rule(json!("a"), Operator::NotEquals)));
    }

    #[test]
    fn test_contains_case_insensitive() {
        assert!(evaluate(
            &json!("TechCorp Industries"),
            &rule(json!("techcorp"), Operator::Contains)
        ));
        assert!(!evaluate(
            &json!("TechCorp Industries"),
            &rule(json!("globex"), Operator::Contains)
        ));
    }

    #[test]
    fn test_contains_fails_closed_on_non_strings() {
        assert!(!evaluate(&json!(12), &rule(json!("1"), Operator::Contains)));
        assert!(!evaluate(&json!(12), &rule(json!("1"), Operator::NotContains)));
        assert!(!evaluate(&Value::Null, &rule(json!("x"), Operator::NotContains)));
        assert!(evaluate(&json!("abc"), &rule(json!("z"), Operator::NotContains)));
    }

    #[test]
    fn test_numeric_comparisons() {
        assert!(evaluate(&json!(10), &rule(json!(5), Operator::GreaterThan)));
        assert!(evaluate(&json!(5), &rule(json!(5), Operator::GreaterEqual)));
        assert!(evaluate(&json!(4.5), &rule(json!(5), Operator::LessThan)));
        assert!(evaluate(&json!(5.0), &rule(json!(5), Operator::LessEqual)));
        assert!(!evaluate(&json!(6), &rule(json!(5), Operator::LessEqual)));
    }

    #[test]
    fn test_comparisons_with_null_actual_are_false() {
        for op in [
            Operator::GreaterThan,
            Operator::LessThan,
            Operator::GreaterEqual,
            Operator::LessEqual,
        ] {
            assert!(!evaluate(&Value::Null, &rule(json!(1), op)), "{op}");
        }
    }

    #[test]
    fn test_comparisons_across_types_are_false() {
        assert!(!evaluate(&json!("10"), &rule(json!(5), Operator::GreaterThan)));
        assert!(!evaluate(&json!(10), &rule(json!([5]), Operator::GreaterThan)));
    }

    #[test]
    fn test_date_comparisons() {
        let after = rule(json!("2024-01-15"), Operator::GreaterThan);
        assert!(evaluate(&json!("2024-02-01"), &after));
        assert!(evaluate(&json!("2024-01-15T10:00:00Z"), &after));
        assert!(!evaluate(&json!("2023-12-31"), &after));
    }

    #[test]
    fn test_in_list() {
        let list = rule(json!(["A", "B"]), Operator::InList);
        assert!(evaluate(&json!("b"), &list));
        assert!(!evaluate(&json!("c"), &list));
        assert!(!evaluate(&Value::Null, &rule(json!(["A"]), Operator::InList)));
        assert!(evaluate(&json!(2), &rule(json!([1, 2.0]), Operator::InList)));
    }

    #[test]
    fn test_in_list_requires_list_value() {
        assert!(!evaluate(&json!("A"), &rule(json!("A"), Operator::InList)));
        assert!(!evaluate(&json!("A"), &rule(json!("B"), Operator::NotInList)));
    }

    #[test]
    fn test_not_in_list() {
        let list = rule(json!(["A", "B"]), Operator::NotInList);
        assert!(evaluate(&json!("c"), &list));
        assert!(!evaluate(&json!("a"), &list));
        assert!(!evaluate(&Value::Null, &list));
    }
}
