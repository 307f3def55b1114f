//! Top-level entry point: replay a sealed traversal (C5), recording the
//! replay's own traversal (C3) and a replay run-history entry (C7).

use std::path::Path;
use std::sync::Arc;

use soulbrowser_core_types::{
    BrowserController, LlmClient, OrchestratorError, OrchestratorResult, RunId, SecretMap, TaskId,
    TaskResult,
};
use tracing::warn;
use traversal_store::{read_traversal, ReadOutcome, TraversalMeta, TraversalStore};

use replay_healing::{AutoContinue, ReplayOutcome, ReplayRunner, StepGate};
use run_history::RunHistoryStore;

use crate::config::EngineConfig;

/// Replay the sealed traversal at `original_traversal_path`. Fails with
/// `session_replay_error` if the file does not yet hold a complete,
/// sealed traversal (callers racing a still-running writer should
/// retry rather than treat that as corruption — §4.3 Invariant 4).
#[allow(clippy::too_many_arguments)]
pub async fn run_replay(
    config: &EngineConfig,
    task_id: &TaskId,
    original_traversal_path: &Path,
    browser: Arc<dyn BrowserController>,
    llm: Option<Arc<dyn LlmClient>>,
    secrets: SecretMap,
    enable_healing: bool,
    gate: Arc<dyn StepGate>,
) -> OrchestratorResult<TaskResult> {
    let original = match read_traversal(original_traversal_path)
        .map_err(|err| OrchestratorError::task_execution(err.to_string()))?
    {
        ReadOutcome::Complete(traversal) => traversal,
        ReadOutcome::InProgress => {
            return Err(OrchestratorError::session_replay(format!(
                "{} is not yet a complete, sealed traversal",
                original_traversal_path.display()
            )))
        }
    };

    let run_id = RunId::new();
    let traversal_dir = config.traversal_base_dir.join(&task_id.0);
    std::fs::create_dir_all(&traversal_dir)
        .map_err(|err| OrchestratorError::task_execution(format!("failed to create traversal dir: {err}")))?;

    let mut store = TraversalStore::start(
        &traversal_dir,
        run_id.clone(),
        TraversalMeta {
            test_case: original.test_case.clone(),
            extra_instructions: original.extra_instructions.clone(),
            browser_config: original.browser_config.clone(),
            secret_names: original.secrets.clone(),
            io_schema: original.io_schema.clone(),
        },
    )
    .map_err(|err| OrchestratorError::task_execution(err.to_string()))?;

    let mut replay_config = config.replay.clone();
    replay_config.enable_healing = enable_healing;
    let runner = ReplayRunner {
        browser,
        llm,
        secrets,
        gate,
        config: replay_config,
    };

    let started = std::time::Instant::now();
    let outcome = runner.replay(&original, &mut store).await;
    let elapsed = started.elapsed().as_secs_f64();

    let history_path = config.history_base_dir.join(&task_id.0).join("run_history.json");
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| OrchestratorError::task_execution(format!("failed to create history dir: {err}")))?;
    }
    let history_store = RunHistoryStore::new(history_path.clone());
    let original_traversal_id = original_traversal_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| original_traversal_path.display().to_string());

    let result = match outcome {
        ReplayOutcome::Success {
            healing_happened,
            extracted_data,
        } => TaskResult::success(
            run_id,
            store.path().display().to_string(),
            history_path.display().to_string(),
            elapsed,
            healing_happened,
            extracted_data,
        ),
        ReplayOutcome::Failed {
            error,
            healing_happened: _,
        } => TaskResult::failure(run_id, &error, elapsed),
    };

    if let Err(err) = history_store.add_replay_run(task_id, &result, original_traversal_id, enable_healing) {
        warn!(task_id = %task_id, error = %err, "orchestrator: failed to record replay run history (not masking replay outcome)");
    }

    Ok(result)
}

/// Convenience constructor for callers that don't need an interactive
/// step gate (the common case — a host driving a paused, step-through
/// replay session supplies its own [`StepGate`] instead).
pub fn auto_continue_gate() -> Arc<dyn StepGate> {
    Arc::new(AutoContinue)
}
