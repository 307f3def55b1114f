//! Return-value envelopes for the two top-level entry points (AI
//! navigation, replay) and for pipeline execution (§3 supplemental
//! entities: `TaskResult`, `TaskError`, `BulkResult` — recovered from the
//! original `BugninjaTaskResult` / `BugninjaTaskError` /
//! `BulkBugninjaTaskResult`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;
use crate::ids::RunId;

/// A narrowed view of [`OrchestratorError`] suitable for embedding in a
/// `TaskResult` and for the run-history file (§7 taxonomy kinds only,
/// plus a free-form context map for anything the structured
/// `ErrorContext` didn't capture).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskError {
    pub error_type: String,
    pub message: String,
    pub context: BTreeMap<String, String>,
}

impl From<&OrchestratorError> for TaskError {
    fn from(err: &OrchestratorError) -> Self {
        let ctx = err.context();
        let mut context = BTreeMap::new();
        if let Some(v) = &ctx.task_description {
            context.insert("task_description".to_string(), v.clone());
        }
        if let Some(v) = ctx.step_number {
            context.insert("step_number".to_string(), v.to_string());
        }
        if let Some(v) = &ctx.action_key {
            context.insert("action_key".to_string(), v.clone());
        }
        if let Some(v) = &ctx.last_url {
            context.insert("last_url".to_string(), v.clone());
        }
        if let Some(v) = &ctx.suggested_action {
            context.insert("suggested_action".to_string(), v.clone());
        }
        Self {
            error_type: err.kind_name().to_string(),
            message: err.to_string(),
            context,
        }
    }
}

/// The outcome of one completed run (AI-navigated or replay), returned by
/// the Navigation Loop's and Replay state machine's top-level entry
/// points and consumed by the Pipeline DAG Runner and the host.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskResult {
    pub run_id: RunId,
    pub success: bool,
    pub error: Option<TaskError>,
    pub traversal_file_path: Option<String>,
    pub history_file_path: Option<String>,
    pub execution_time_secs: f64,
    pub healing_happened: bool,
    pub extracted_data: BTreeMap<String, String>,
}

impl TaskResult {
    pub fn success(
        run_id: RunId,
        traversal_file_path: impl Into<String>,
        history_file_path: impl Into<String>,
        execution_time_secs: f64,
        healing_happened: bool,
        extracted_data: BTreeMap<String, String>,
    ) -> Self {
        Self {
            run_id,
            success: true,
            error: None,
            traversal_file_path: Some(traversal_file_path.into()),
            history_file_path: Some(history_file_path.into()),
            execution_time_secs,
            healing_happened,
            extracted_data,
        }
    }

    pub fn failure(run_id: RunId, error: &OrchestratorError, execution_time_secs: f64) -> Self {
        Self {
            run_id,
            success: false,
            error: Some(TaskError::from(error)),
            traversal_file_path: None,
            history_file_path: None,
            execution_time_secs,
            healing_happened: false,
            extracted_data: BTreeMap::new(),
        }
    }
}

/// Aggregates multiple [`TaskResult`]s for pipeline execution (the
/// original's `BulkBugninjaTaskResult`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BulkResult {
    pub results: Vec<TaskResult>,
}

impl BulkResult {
    pub fn push(&mut self, result: TaskResult) {
        self.results.push(result);
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }
}
