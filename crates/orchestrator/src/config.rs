//! Ambient component A2: a single explicit `EngineConfig`, passed by
//! reference into every top-level entry point. No global/ambient
//! singleton anywhere in this crate (§6 "Ambient interfaces added by
//! this expansion").

use std::path::PathBuf;
use std::time::Duration;

use navigation_loop::NavigationLoopConfig;
use replay_healing::ReplayConfig;

/// Workspace-wide engine configuration. `navigation` and `replay` are
/// handed straight to C4/C5; the remaining fields are this crate's own
/// (where runs are rooted on disk).
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub navigation: NavigationLoopConfig,
    pub replay: ReplayConfig,
    /// Traversal files land under `<traversal_base_dir>/<task_id>/`.
    pub traversal_base_dir: PathBuf,
    /// `run_history.json` files land under `<history_base_dir>/<task_id>/`.
    pub history_base_dir: PathBuf,
    /// Per-run browser-data directory base; a caller building a browser
    /// session for `run_id` should isolate it under
    /// `<browser_data_base_dir>/run_<run_id>/` (§3 per-run isolation note).
    pub browser_data_base_dir: PathBuf,
}

impl EngineConfig {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        Self {
            navigation: NavigationLoopConfig::default(),
            replay: ReplayConfig::default(),
            traversal_base_dir: state_dir.join("traversals"),
            history_base_dir: state_dir.join("history"),
            browser_data_base_dir: state_dir.join("browser_data"),
        }
    }

    /// `<browser_data_base_dir>/run_<run_id>/`, the isolated data
    /// directory a caller should build its browser session against.
    pub fn browser_data_dir(&self, run_id: &soulbrowser_core_types::RunId) -> PathBuf {
        self.browser_data_base_dir.join(format!("run_{run_id}"))
    }

    pub fn llm_timeout(&self) -> Duration {
        self.navigation.llm_timeout
    }

    pub fn browser_action_timeout(&self) -> Duration {
        self.navigation.browser_action_timeout
    }
}
