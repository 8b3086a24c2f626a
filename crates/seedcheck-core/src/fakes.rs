//! In-memory fakes for the executor and data-provider seams (testing only)
//!
//! Provides `ScriptedExecutor`, `RecordingExecutor` and `MemoryDataProvider`
//! that satisfy the trait contracts without a browser or a data service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::diversity::DataProvider;
use crate::domain::{Action, ExecutorError, ProviderError, TaskVariant};
use crate::seed_verify::{ExecutionResult, Executor};

// ---------------------------------------------------------------------------
// ScriptedExecutor
// ---------------------------------------------------------------------------

/// What a [`ScriptedExecutor`] does for one seed.
#[derive(Debug, Clone)]
pub enum SeedScript {
    Return(ExecutionResult),
    Fail(String),
    /// Never completes; only a timeout ends the call.
    Hang,
    Panic,
}

/// Executor answering from a per-seed script, with a fallback for
/// unscripted seeds.
#[derive(Debug)]
pub struct ScriptedExecutor {
    scripts: HashMap<i64, SeedScript>,
    fallback: SeedScript,
}

impl Default for ScriptedExecutor {
    fn default() -> Self {
        Self::passing()
    }
}

impl ScriptedExecutor {
    /// Every seed scores 1.0 on a single test.
    pub fn passing() -> Self {
        Self {
            scripts: HashMap::new(),
            fallback: SeedScript::Return(ExecutionResult::new(1.0, 1, 1)),
        }
    }

    pub fn with_fallback(mut self, script: SeedScript) -> Self {
        self.fallback = script;
        self
    }

    pub fn on_seed(mut self, seed: i64, script: SeedScript) -> Self {
        self.scripts.insert(seed, script);
        self
    }

    pub fn score(self, seed: i64, score: f64, tests_passed: usize, total_tests: usize) -> Self {
        self.on_seed(
            seed,
            SeedScript::Return(ExecutionResult::new(score, tests_passed, total_tests)),
        )
    }

    pub fn fail(self, seed: i64, message: impl Into<String>) -> Self {
        self.on_seed(seed, SeedScript::Fail(message.into()))
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn execute(
        &self,
        task: &TaskVariant,
        _actions: &[Action],
    ) -> Result<ExecutionResult, ExecutorError> {
        match self.scripts.get(&task.seed).unwrap_or(&self.fallback) {
            SeedScript::Return(result) => Ok(result.clone()),
            SeedScript::Fail(message) => Err(ExecutorError::Failed(message.clone())),
            SeedScript::Hang => std::future::pending().await,
            SeedScript::Panic => panic!("scripted executor panic for seed {}", task.seed),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingExecutor
// ---------------------------------------------------------------------------

/// One call observed by a [`RecordingExecutor`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub task: TaskVariant,
    pub actions: Vec<Action>,
}

/// Executor that records every call and returns the same result each time.
#[derive(Debug)]
pub struct RecordingExecutor {
    result: ExecutionResult,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self::new(ExecutionResult::new(1.0, 1, 1))
    }
}

impl RecordingExecutor {
    pub fn new(result: ExecutionResult) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls recorded so far, ordered by seed.
    pub fn calls(&self) -> Vec<RecordedCall> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort_by_key(|c| c.task.seed);
        calls
    }

    pub fn call_for_seed(&self, seed: i64) -> Option<RecordedCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.task.seed == seed)
            .cloned()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn execute(
        &self,
        task: &TaskVariant,
        actions: &[Action],
    ) -> Result<ExecutionResult, ExecutorError> {
        self.calls.lock().unwrap().push(RecordedCall {
            task: task.clone(),
            actions: actions.to_vec(),
        });
        Ok(self.result.clone())
    }
}

// ---------------------------------------------------------------------------
// MemoryDataProvider
// ---------------------------------------------------------------------------

/// Data provider serving datasets from a `HashMap<(project, seed), Value>`.
///
/// Unknown keys fail with [`ProviderError::Fetch`].
#[derive(Debug, Default)]
pub struct MemoryDataProvider {
    datasets: Mutex<HashMap<(String, i64), Value>>,
    fetches: AtomicU64,
}

impl MemoryDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(self, project: impl Into<String>, seed: i64, data: Value) -> Self {
        self.insert(project, seed, data);
        self
    }

    pub fn insert(&self, project: impl Into<String>, seed: i64, data: Value) {
        self.datasets
            .lock()
            .unwrap()
            .insert((project.into(), seed), data);
    }

    /// Number of `fetch` calls served, including failed ones.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DataProvider for MemoryDataProvider {
    async fn fetch(&self, project: &str, seed: i64) -> Result<Value, ProviderError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.datasets
            .lock()
            .unwrap()
            .get(&(project.to_string(), seed))
            .cloned()
            .ok_or_else(|| ProviderError::Fetch(format!("no dataset for {project} seed {seed}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UseCase;
    use serde_json::json;

    fn task(seed: i64) -> TaskVariant {
        TaskVariant {
            seed,
            prompt: "p".to_string(),
            url: format!("http://app/?seed={seed}"),
            tests: vec![],
            use_case: UseCase::new("SEARCH"),
        }
    }

    #[tokio::test]
    async fn scripted_executor_uses_seed_script_then_fallback() {
        let exec = ScriptedExecutor::passing().score(2, 0.5, 1, 2).fail(3, "crash");
        assert_eq!(exec.execute(&task(1), &[]).await.unwrap().score, 1.0);
        assert_eq!(exec.execute(&task(2), &[]).await.unwrap().score, 0.5);
        assert!(matches!(
            exec.execute(&task(3), &[]).await,
            Err(ExecutorError::Failed(m)) if m == "crash"
        ));
    }

    #[tokio::test]
    async fn recording_executor_keeps_calls() {
        let exec = RecordingExecutor::default();
        exec.execute(&task(9), &[Action::navigate("http://app/?seed=9")])
            .await
            .unwrap();
        assert_eq!(exec.call_count(), 1);
        let call = exec.call_for_seed(9).unwrap();
        assert_eq!(call.actions.len(), 1);
    }

    #[tokio::test]
    async fn memory_provider_serves_and_fails() {
        let provider = MemoryDataProvider::new().with_dataset("shop", 1, json!({"p": [1]}));
        assert!(provider.fetch("shop", 1).await.is_ok());
        assert!(matches!(
            provider.fetch("shop", 2).await,
            Err(ProviderError::Fetch(_))
        ));
        assert_eq!(provider.fetch_count(), 2);
    }
}
