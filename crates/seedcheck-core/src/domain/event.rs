//! Backend events, tests over them, and seeded task variants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::criteria::CriteriaBundle;

/// A structured observation emitted by the application backend while a
/// candidate action sequence runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub agent_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl EventRecord {
    pub fn new(name: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamp: Utc::now(),
            agent_id: agent_id.into(),
            user_id: None,
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Field value, `Null` when the field was not emitted.
    pub fn field(&self, key: &str) -> &Value {
        self.fields.get(key).unwrap_or(&Value::Null)
    }
}

/// Expectation that some event named `event_name` satisfies `criteria`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub event_name: String,
    #[serde(default)]
    pub criteria: CriteriaBundle,
}

impl Test {
    pub fn new(event_name: impl Into<String>, criteria: CriteriaBundle) -> Self {
        Self {
            event_name: event_name.into(),
            criteria,
        }
    }
}

/// A test as found on a reference task, where the event name may be implied
/// by the use case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTest {
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub criteria: CriteriaBundle,
}

impl ReferenceTest {
    /// Resolve into a concrete [`Test`], defaulting the event name to the use case.
    pub fn resolve(&self, use_case: &UseCase) -> Test {
        let event_name = self
            .event_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(use_case.name.as_str());
        Test::new(event_name, self.criteria.clone())
    }
}

impl From<Test> for ReferenceTest {
    fn from(test: Test) -> Self {
        Self {
            event_name: Some(test.event_name),
            criteria: test.criteria,
        }
    }
}

/// The use case a task exercises. Its name doubles as the default event name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseCase {
    pub name: String,
    /// Other event names the backend may emit for this use case.
    #[serde(default)]
    pub event_aliases: Vec<String>,
}

impl UseCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            event_aliases: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.event_aliases.push(alias.into());
        self
    }
}

/// A seed-specific reconstruction of one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskVariant {
    pub seed: i64,
    pub prompt: String,
    pub url: String,
    pub tests: Vec<Test>,
    pub use_case: UseCase,
}
