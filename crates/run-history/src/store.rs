//! Atomic temp+rename persistence for one task's run-history file
//! (§4.7), grounded in the teacher's `RunHistoryManager` (load/save,
//! `add_ai_run`/`add_replay_run`, summary recomputation).

use std::path::{Path, PathBuf};

use chrono::Utc;
use soulbrowser_core_types::{write_atomic, TaskId, TaskResult};
use tracing::{debug, info};

use crate::errors::RunHistoryError;
use crate::model::{AiRunEntry, ReplayRunEntry, RunHistory, RunStatus};

/// Owns the on-disk location of one task's `run_history.json` and
/// mediates every read/append/write against it.
pub struct RunHistoryStore {
    path: PathBuf,
}

impl RunHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the history file. A missing file is [`RunHistoryError::NotFound`]
    /// (not an error the caller should propagate past `load_or_create`);
    /// a present-but-unparseable file is [`RunHistoryError::Corrupted`]
    /// and MUST be surfaced rather than silently replaced (§4.7).
    pub fn load(&self) -> Result<RunHistory, RunHistoryError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(RunHistoryError::NotFound)
            }
            Err(err) => return Err(RunHistoryError::Read(err)),
        };
        serde_json::from_slice(&bytes).map_err(RunHistoryError::Corrupted)
    }

    /// Load the history, or mint a fresh empty one for `task_id` if none
    /// exists yet. Corrupted files still propagate — this only covers
    /// the "first run ever" case, never papers over a bad file.
    pub fn load_or_create(&self, task_id: &TaskId) -> Result<RunHistory, RunHistoryError> {
        match self.load() {
            Ok(history) => Ok(history),
            Err(RunHistoryError::NotFound) => Ok(RunHistory::new(task_id.clone(), Utc::now())),
            Err(other) => Err(other),
        }
    }

    pub fn save(&self, history: &RunHistory) -> Result<(), RunHistoryError> {
        let bytes = serde_json::to_vec_pretty(history).map_err(RunHistoryError::Serialize)?;
        write_atomic(&self.path, &bytes).map_err(RunHistoryError::Io)?;
        debug!(path = %self.path.display(), "run history: wrote");
        Ok(())
    }

    /// Append one AI-navigated run entry derived from `result`,
    /// recompute `summary`, and persist atomically.
    pub fn add_ai_run(
        &self,
        task_id: &TaskId,
        result: &TaskResult,
    ) -> Result<RunHistory, RunHistoryError> {
        let mut history = self.load_or_create(task_id)?;
        history.push_ai_run(AiRunEntry {
            run_id: result.run_id.clone(),
            timestamp: Utc::now(),
            status: RunStatus::from_success(result.success),
            traversal_path: result.traversal_file_path.clone().unwrap_or_default(),
            execution_time_secs: result.execution_time_secs,
            error_message: result.error.as_ref().map(|e| e.message.clone()),
        });
        self.save(&history)?;
        info!(task_id = %task_id, run_id = %result.run_id, success = result.success, "run history: recorded ai-navigated run");
        Ok(history)
    }

    /// Append one replay run entry. `original_traversal_id` identifies
    /// the sealed traversal this replay was driven from.
    pub fn add_replay_run(
        &self,
        task_id: &TaskId,
        result: &TaskResult,
        original_traversal_id: impl Into<String>,
        healing_enabled: bool,
    ) -> Result<RunHistory, RunHistoryError> {
        let mut history = self.load_or_create(task_id)?;
        history.push_replay_run(ReplayRunEntry {
            run_id: result.run_id.clone(),
            timestamp: Utc::now(),
            status: RunStatus::from_success(result.success),
            traversal_path: result.traversal_file_path.clone().unwrap_or_default(),
            execution_time_secs: result.execution_time_secs,
            error_message: result.error.as_ref().map(|e| e.message.clone()),
            original_traversal_id: original_traversal_id.into(),
            healing_enabled,
        });
        self.save(&history)?;
        info!(task_id = %task_id, run_id = %result.run_id, success = result.success, "run history: recorded replay run");
        Ok(history)
    }

    /// Path to the traversal of the most recent AI-navigated run, if
    /// any — the teacher's `get_latest_ai_run_traversal`.
    pub fn latest_ai_run_traversal(&self) -> Result<Option<String>, RunHistoryError> {
        match self.load() {
            Ok(history) => Ok(history
                .ai_navigated_runs
                .last()
                .map(|run| run.traversal_path.clone())
                .filter(|path| !path.is_empty())),
            Err(RunHistoryError::NotFound) => Ok(None),
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulbrowser_core_types::{OrchestratorError, RunId};

    fn success_result() -> TaskResult {
        TaskResult::success(
            RunId::new(),
            "traverse_20260101_000000_abc.json",
            "run_history.json",
            1.5,
            false,
            Default::default(),
        )
    }

    #[test]
    fn load_of_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunHistoryStore::new(dir.path().join("run_history.json"));
        assert!(matches!(store.load(), Err(RunHistoryError::NotFound)));
    }

    #[test]
    fn add_ai_run_creates_file_and_recomputes_summary() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunHistoryStore::new(dir.path().join("run_history.json"));
        let task_id = TaskId::new();
        let history = store.add_ai_run(&task_id, &success_result()).unwrap();
        assert_eq!(history.summary.total_ai_runs, 1);
        assert_eq!(history.summary.successful_ai_runs, 1);

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.ai_navigated_runs.len(), 1);
    }

    #[test]
    fn add_replay_run_records_healing_and_original_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunHistoryStore::new(dir.path().join("run_history.json"));
        let task_id = TaskId::new();
        let failing = TaskResult::failure(
            RunId::new(),
            &OrchestratorError::session_replay("locator exhausted"),
            3.0,
        );
        let history = store
            .add_replay_run(&task_id, &failing, "orig-traversal-id", true)
            .unwrap();
        assert_eq!(history.summary.total_replay_runs, 1);
        assert_eq!(history.summary.successful_replay_runs, 0);
        let entry = &history.replay_runs[0];
        assert_eq!(entry.original_traversal_id, "orig-traversal-id");
        assert!(entry.healing_enabled);
        assert!(entry.error_message.is_some());
    }

    #[test]
    fn corrupted_file_is_surfaced_not_silently_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_history.json");
        std::fs::write(&path, b"{not json").unwrap();
        let store = RunHistoryStore::new(path);
        assert!(matches!(store.load(), Err(RunHistoryError::Corrupted(_))));
        // load_or_create must propagate the corruption, never mint a
        // fresh history over it.
        assert!(store.load_or_create(&TaskId::new()).is_err());
    }

    #[test]
    fn latest_ai_run_traversal_returns_most_recent_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunHistoryStore::new(dir.path().join("run_history.json"));
        let task_id = TaskId::new();
        store.add_ai_run(&task_id, &success_result()).unwrap();
        let mut second = success_result();
        second.traversal_file_path = Some("traverse_20260102_000000_def.json".to_string());
        store.add_ai_run(&task_id, &second).unwrap();

        let latest = store.latest_ai_run_traversal().unwrap();
        assert_eq!(latest.as_deref(), Some("traverse_20260102_000000_def.json"));
    }
}
