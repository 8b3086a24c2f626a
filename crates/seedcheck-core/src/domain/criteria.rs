//! Criterion, per-field expectations and criteria bundles.
//!
//! Wire shape of a criterion is `{"value": ..., "operator": "..."}` with the
//! operator defaulting to `equals`. A field may also carry a bare value
//! (legacy substring/equality semantics) or `null` (wildcard).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::CriteriaError;

/// Comparison operator of an explicit [`Criterion`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
    InList,
    NotInList,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::GreaterEqual => "greater_equal",
            Self::LessEqual => "less_equal",
            Self::InList => "in_list",
            Self::NotInList => "not_in_list",
        }
    }

    /// Parse the wire name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        let op = match name.trim().to_ascii_lowercase().as_str() {
            "equals" => Self::Equals,
            "not_equals" => Self::NotEquals,
            "contains" => Self::Contains,
            "not_contains" => Self::NotContains,
            "greater_than" => Self::GreaterThan,
            "less_than" => Self::LessThan,
            "greater_equal" => Self::GreaterEqual,
            "less_equal" => Self::LessEqual,
            "in_list" => Self::InList,
            "not_in_list" => Self::NotInList,
            _ => return None,
        };
        Some(op)
    }

    /// Whether the operator compares against a list of candidates.
    pub fn takes_list(&self) -> bool {
        matches!(self, Self::InList | Self::NotInList)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One comparison rule for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub value: Value,
    #[serde(default)]
    pub operator: Operator,
}

impl Criterion {
    pub fn new(value: impl Into<Value>, operator: Operator) -> Self {
        Self {
            value: value.into(),
            operator,
        }
    }

    pub fn equals(value: impl Into<Value>) -> Self {
        Self::new(value, Operator::Equals)
    }

    pub fn contains(value: impl Into<Value>) -> Self {
        Self::new(value, Operator::Contains)
    }

    pub fn in_list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(
            Value::Array(values.into_iter().map(Into::into).collect()),
            Operator::InList,
        )
    }

    /// Check the value-shape invariant: list operators take a list, every
    /// other operator takes a scalar.
    pub fn validate(&self) -> Result<(), CriteriaError> {
        let is_list = self.value.is_array();
        if self.operator.takes_list() && !is_list {
            return Err(CriteriaError::ListRequired {
                operator: self.operator.to_string(),
                found: value_kind(&self.value).to_string(),
            });
        }
        if !self.operator.takes_list() && (is_list || self.value.is_object()) {
            return Err(CriteriaError::ScalarRequired {
                operator: self.operator.to_string(),
                found: value_kind(&self.value).to_string(),
            });
        }
        Ok(())
    }
}

/// Expected shape of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Expectation {
    /// Matches anything.
    Wildcard,
    /// Legacy bare value: substring for strings, strict equality otherwise.
    Bare(Value),
    /// Explicit operator rule.
    Rule(Criterion),
}

impl Expectation {
    pub fn validate(&self) -> Result<(), CriteriaError> {
        match self {
            Self::Rule(criterion) => criterion.validate(),
            Self::Wildcard | Self::Bare(_) => Ok(()),
        }
    }
}

impl From<Criterion> for Expectation {
    fn from(criterion: Criterion) -> Self {
        Self::Rule(criterion)
    }
}

impl TryFrom<Value> for Expectation {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Self::Wildcard),
            Value::Object(map) if map.contains_key("value") => {
                let operator = match map.get("operator") {
                    None | Some(Value::Null) => Operator::default(),
                    Some(Value::String(name)) => Operator::parse(name)
                        .ok_or_else(|| format!("unknown criterion operator: {name}"))?,
                    Some(other) => {
                        return Err(format!(
                            "criterion operator must be a string, got {}",
                            value_kind(other)
                        ))
                    }
                };
                let value = map.get("value").cloned().unwrap_or(Value::Null);
                Ok(Self::Rule(Criterion { value, operator }))
            }
            other => Ok(Self::Bare(other)),
        }
    }
}

impl From<Expectation> for Value {
    fn from(expectation: Expectation) -> Self {
        match expectation {
            Expectation::Wildcard => Value::Null,
            Expectation::Bare(value) => value,
            Expectation::Rule(criterion) => serde_json::json!({
                "value": criterion.value,
                "operator": criterion.operator.as_str(),
            }),
        }
    }
}

/// Field name → expectation for one event type. Built once, then read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriteriaBundle {
    fields: BTreeMap<String, Expectation>,
}

impl CriteriaBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expectation for `field` (builder pattern).
    pub fn with(mut self, field: impl Into<String>, expectation: impl Into<Expectation>) -> Self {
        self.fields.insert(field.into(), expectation.into());
        self
    }

    /// Add a legacy bare value for `field`.
    pub fn with_bare(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Expectation::Bare(value.into()))
    }

    pub fn get(&self, field: &str) -> Option<&Expectation> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expectation)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate every explicit criterion, reporting the first offending field.
    pub fn validate(&self) -> Result<(), CriteriaError> {
        for (field, expectation) in &self.fields {
            expectation
                .validate()
                .map_err(|source| CriteriaError::Field {
                    field: field.clone(),
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }
}

impl<K: Into<String>, E: Into<Expectation>> FromIterator<(K, E)> for CriteriaBundle {
    fn from_iter<T: IntoIterator<Item = (K, E)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, e)| (k.into(), e.into()))
                .collect(),
        }
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_defaults_to_equals() {
        let exp: Expectation = serde_json::from_value(json!({"value": "active"})).unwrap();
        assert_eq!(exp, Expectation::Rule(Criterion::equals("active")));
    }

    #[test]
    fn test_operator_parse_is_case_insensitive() {
        assert_eq!(Operator::parse("IN_LIST"), Some(Operator::InList));
        assert_eq!(Operator::parse(" greater_equal "), Some(Operator::GreaterEqual));
        assert_eq!(Operator::parse("between"), None);
    }

    #[test]
    fn test_unknown_operator_is_rejected_on_parse() {
        let res: Result<Expectation, _> =
            serde_json::from_value(json!({"value": 1, "operator": "between"}));
        assert!(res.is_err());
    }

    #[test]
    fn test_null_is_wildcard_and_scalar_is_bare() {
        let bundle: CriteriaBundle = serde_json::from_value(json!({
            "company": null,
            "name": "TechCorp",
            "price": {"value": 10, "operator": "less_than"}
        }))
        .unwrap();

        assert_eq!(bundle.get("company"), Some(&Expectation::Wildcard));
        assert_eq!(bundle.get("name"), Some(&Expectation::Bare(json!("TechCorp"))));
        assert_eq!(
            bundle.get("price"),
            Some(&Expectation::Rule(Criterion::new(10, Operator::LessThan)))
        );
    }

    #[test]
    fn test_bundle_serializes_back_to_wire_shape() {
        let bundle = CriteriaBundle::new()
            .with("status", Criterion::new("x", Operator::NotEquals))
            .with_bare("query", "shoes")
            .with("any", Expectation::Wildcard);

        let raw = serde_json::to_value(&bundle).unwrap();
        assert_eq!(
            raw,
            json!({
                "any": null,
                "query": "shoes",
                "status": {"value": "x", "operator": "not_equals"}
            })
        );
    }

    #[test]
    fn test_validate_list_operator_requires_list() {
        let err = Criterion::new("A", Operator::InList).validate().unwrap_err();
        assert!(matches!(err, CriteriaError::ListRequired { .. }));
        assert!(Criterion::in_list(["A", "B"]).validate().is_ok());
    }

    #[test]
    fn test_validate_scalar_operator_rejects_list() {
        let err = Criterion::new(json!([1, 2]), Operator::GreaterThan)
            .validate()
            .unwrap_err();
        assert!(matches!(err, CriteriaError::ScalarRequired { .. }));
    }

    #[test]
    fn test_bundle_validate_reports_field() {
        let bundle = CriteriaBundle::new()
            .with("ok", Criterion::equals(1))
            .with("bad", Criterion::new(3, Operator::NotInList));
        match bundle.validate() {
            Err(CriteriaError::Field { field, .. }) => assert_eq!(field, "bad"),
            other => panic!("expected field error, got {other:?}"),
        }
    }
}
