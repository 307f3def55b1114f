//! The run-history data model (§3 `RunHistory`, §4.7): two append-only
//! arrays plus a `summary` that is always re-derived from them rather
//! than accumulated incrementally, so a corrupted counter can never
//! drift from the underlying arrays (SPEC_FULL §4.7 supplemental,
//! grounded in the teacher's `run_history_manager.py`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soulbrowser_core_types::{RunId, TaskId};

/// `success` / `failed`, as recorded per run (§3 `RunHistory`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failed,
}

impl RunStatus {
    pub fn from_success(success: bool) -> Self {
        if success {
            Self::Success
        } else {
            Self::Failed
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// One entry of `ai_navigated_runs` (§3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AiRunEntry {
    pub run_id: RunId,
    pub timestamp: DateTime<Utc>,
    pub status: RunStatus,
    pub traversal_path: String,
    pub execution_time_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// One entry of `replay_runs`: an [`AiRunEntry`]'s fields plus the
/// replay-specific `original_traversal_id` and `healing_enabled` (§3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReplayRunEntry {
    pub run_id: RunId,
    pub timestamp: DateTime<Utc>,
    pub status: RunStatus,
    pub traversal_path: String,
    pub execution_time_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub original_traversal_id: String,
    pub healing_enabled: bool,
}

/// Derived counters, recomputed from the two arrays on every append
/// (never accumulated) — §4.7 supplemental.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_ai_runs: u64,
    pub total_replay_runs: u64,
    pub successful_ai_runs: u64,
    pub successful_replay_runs: u64,
}

impl Summary {
    /// A pure function of the two run arrays. Re-derived on every
    /// append rather than maintained as running counters, so a torn or
    /// hand-edited history file can never leave `summary` inconsistent
    /// with the arrays it describes.
    pub fn recompute(ai_runs: &[AiRunEntry], replay_runs: &[ReplayRunEntry]) -> Self {
        Self {
            total_ai_runs: ai_runs.len() as u64,
            total_replay_runs: replay_runs.len() as u64,
            successful_ai_runs: ai_runs.iter().filter(|r| r.status.is_success()).count() as u64,
            successful_replay_runs: replay_runs
                .iter()
                .filter(|r| r.status.is_success())
                .count() as u64,
        }
    }
}

/// Per-task JSON log of AI-navigated and replay runs (§3 `RunHistory`,
/// §4.7). Append-only except for `summary`, which is recomputed whole
/// on every append.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunHistory {
    pub task_id: TaskId,
    pub created_date: DateTime<Utc>,
    pub ai_navigated_runs: Vec<AiRunEntry>,
    pub replay_runs: Vec<ReplayRunEntry>,
    pub summary: Summary,
}

impl RunHistory {
    pub fn new(task_id: TaskId, created_date: DateTime<Utc>) -> Self {
        Self {
            task_id,
            created_date,
            ai_navigated_runs: Vec::new(),
            replay_runs: Vec::new(),
            summary: Summary::default(),
        }
    }

    pub fn push_ai_run(&mut self, entry: AiRunEntry) {
        self.ai_navigated_runs.push(entry);
        self.resummarize();
    }

    pub fn push_replay_run(&mut self, entry: ReplayRunEntry) {
        self.replay_runs.push(entry);
        self.resummarize();
    }

    fn resummarize(&mut self) {
        self.summary = Summary::recompute(&self.ai_navigated_runs, &self.replay_runs);
    }
}
