//! Matching one event record against a criteria bundle.
//!
//! Criterion values may carry placeholder tokens such as `<web_agent_id>`
//! that only become concrete once the record under test is known. They are
//! resolved per record through [`TokenResolvers`] before comparison.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::Value;

use crate::domain::criteria::{CriteriaBundle, Criterion, Expectation};
use crate::domain::event::EventRecord;
use crate::matcher::evaluate::evaluate;

/// Placeholder for the id of the agent that produced the record.
pub const WEB_AGENT_ID_TOKEN: &str = "<web_agent_id>";

const TOKEN_PATTERN: &str = r"<[A-Za-z][A-Za-z0-9_]*>";

fn token_regex() -> Option<&'static Regex> {
    static TOKEN_RE: OnceLock<Option<Regex>> = OnceLock::new();
    TOKEN_RE.get_or_init(|| Regex::new(TOKEN_PATTERN).ok()).as_ref()
}

/// Resolves a placeholder token against the record being matched.
pub type TokenResolver = Arc<dyn Fn(&EventRecord) -> Option<String> + Send + Sync>;

/// Token → resolver map. Unknown tokens, and tokens whose resolver yields
/// `None`, are left verbatim.
#[derive(Clone)]
pub struct TokenResolvers {
    resolvers: BTreeMap<String, TokenResolver>,
}

impl Default for TokenResolvers {
    fn default() -> Self {
        Self::empty().with(WEB_AGENT_ID_TOKEN, |record| Some(record.agent_id.clone()))
    }
}

impl std::fmt::Debug for TokenResolvers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.resolvers.keys()).finish()
    }
}

impl TokenResolvers {
    pub fn empty() -> Self {
        Self {
            resolvers: BTreeMap::new(),
        }
    }

    /// Register a resolver for `token` (e.g. `"<user_id>"`).
    pub fn with<F>(mut self, token: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&EventRecord) -> Option<String> + Send + Sync + 'static,
    {
        self.resolvers.insert(token.into(), Arc::new(resolver));
        self
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.resolvers.keys().map(String::as_str)
    }

    /// Replace every known token in `text`.
    pub fn substitute<'a>(&self, text: &'a str, record: &EventRecord) -> Cow<'a, str> {
        if self.resolvers.is_empty() || !text.contains('<') {
            return Cow::Borrowed(text);
        }
        let Some(re) = token_regex() else {
            return Cow::Borrowed(text);
        };
        re.replace_all(text, |caps: &regex::Captures| {
            let token = &caps[0];
            self.resolvers
                .get(token)
                .and_then(|resolve| resolve(record))
                .unwrap_or_else(|| token.to_string())
        })
    }

    fn substitute_value<'a>(&self, value: &'a Value, record: &EventRecord) -> Cow<'a, Value> {
        match value {
            Value::String(text) => match self.substitute(text, record) {
                Cow::Borrowed(_) => Cow::Borrowed(value),
                Cow::Owned(replaced) => Cow::Owned(Value::String(replaced)),
            },
            Value::Array(items) if items.iter().any(Value::is_string) => Cow::Owned(Value::Array(
                items
                    .iter()
                    .map(|item| self.substitute_value(item, record).into_owned())
                    .collect(),
            )),
            _ => Cow::Borrowed(value),
        }
    }

    /// The expectation with tokens resolved for `record`.
    pub fn resolve<'a>(&self, expectation: &'a Expectation, record: &EventRecord) -> Cow<'a, Expectation> {
        match expectation {
            Expectation::Wildcard => Cow::Borrowed(expectation),
            Expectation::Bare(value) => match self.substitute_value(value, record) {
                Cow::Borrowed(_) => Cow::Borrowed(expectation),
                Cow::Owned(v) => Cow::Owned(Expectation::Bare(v)),
            },
            Expectation::Rule(criterion) => match self.substitute_value(&criterion.value, record) {
                Cow::Borrowed(_) => Cow::Borrowed(expectation),
                Cow::Owned(v) => Cow::Owned(Expectation::Rule(Criterion {
                    value: v,
                    operator: criterion.operator,
                })),
            },
        }
    }
}

/// AND across the bundle's fields: every field's expectation must hold for
/// the record's value of that field. Fields the bundle does not mention are
/// not checked, so an empty bundle always holds.
pub fn all_fields<F>(record: &EventRecord, bundle: &CriteriaBundle, mut check: F) -> bool
where
    F: FnMut(&Value, &Expectation) -> bool,
{
    bundle
        .iter()
        .all(|(field, expectation)| check(record.field(field), expectation))
}

/// Decides whether a single record satisfies a bundle.
#[derive(Debug, Clone, Default)]
pub struct CriteriaMatcher {
    tokens: TokenResolvers,
}

impl CriteriaMatcher {
    pub fn new(tokens: TokenResolvers) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &TokenResolvers {
        &self.tokens
    }

    pub fn matches(&self, record: &EventRecord, bundle: &CriteriaBundle) -> bool {
        all_fields(record, bundle, |actual, expectation| {
            evaluate(actual, &self.tokens.resolve(expectation, record))
        })
    }
}
