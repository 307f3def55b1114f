//! Top-level entry point: run one AI-navigated task (C4) and record it
//! to run-history (C7), durably persisting the traversal as it goes
//! (C3). Grounded in the teacher's `BugninjaClient.run_task` shape: one
//! call in, one `TaskResult` out, everything in between handled by the
//! components it wires together.

use std::sync::Arc;

use soulbrowser_core_types::{
    BrowserConfig, BrowserController, IoSchema, LlmClient, OrchestratorError, RunId, SecretMap,
    TaskId, TaskResult,
};
use tracing::{info, warn};
use traversal_store::{TraversalMeta, TraversalStore};

use navigation_loop::{CancellationToken, NavigationLoop, NavigationOutcome};
use run_history::RunHistoryStore;

use crate::config::EngineConfig;

/// The task-level inputs a single navigation run needs, independent of
/// whether it came from a pipeline node or a standalone host call.
#[derive(Clone, Debug)]
pub struct NavigationRequest {
    pub test_case: String,
    pub extra_instructions: Vec<String>,
    pub input_schema: std::collections::BTreeMap<String, String>,
    pub output_schema: std::collections::BTreeMap<String, String>,
    pub secret_names: Vec<String>,
    pub max_steps: Option<u32>,
    pub allowed_domains: Vec<String>,
}

/// Run one AI-navigated task to completion. The returned [`TaskResult`]
/// always carries a `run_id`; on success it also names the traversal
/// and run-history files the caller can read back.
pub async fn run_navigation(
    config: &EngineConfig,
    task_id: &TaskId,
    request: &NavigationRequest,
    browser: Arc<dyn BrowserController>,
    llm: Arc<dyn LlmClient>,
    secrets: SecretMap,
    cancellation: CancellationToken,
) -> TaskResult {
    let run_id = RunId::new();
    let traversal_dir = config.traversal_base_dir.join(&task_id.0);
    if let Err(err) = std::fs::create_dir_all(&traversal_dir) {
        return TaskResult::failure(
            run_id,
            &OrchestratorError::task_execution(format!("failed to create traversal dir: {err}")),
            0.0,
        );
    }

    let browser_config = BrowserConfig {
        allowed_domains: request.allowed_domains.clone(),
        ..BrowserConfig::desktop_default()
    };

    let mut store = match TraversalStore::start(
        &traversal_dir,
        run_id.clone(),
        TraversalMeta {
            test_case: request.test_case.clone(),
            extra_instructions: request.extra_instructions.clone(),
            browser_config,
            secret_names: request.secret_names.clone(),
            io_schema: Some(IoSchema {
                input_schema: request.input_schema.clone(),
                output_schema: request.output_schema.clone(),
            }),
        },
    ) {
        Ok(store) => store,
        Err(err) => {
            return TaskResult::failure(
                run_id,
                &OrchestratorError::task_execution(err.to_string()),
                0.0,
            )
        }
    };

    let mut loop_config = config.navigation.clone();
    if let Some(max_steps) = request.max_steps {
        loop_config.max_steps = max_steps;
    }
    let navigation = NavigationLoop::new(browser, llm, secrets, loop_config, cancellation);

    info!(task_id = %task_id, run_id = %run_id, "orchestrator: starting navigation run");
    let started = std::time::Instant::now();
    let outcome = navigation
        .run(
            &request.test_case,
            &request.extra_instructions,
            &request.output_schema,
            &mut store,
        )
        .await;
    let elapsed = started.elapsed().as_secs_f64();

    let history_path = config.history_base_dir.join(&task_id.0).join("run_history.json");
    if let Some(parent) = history_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let history_store = RunHistoryStore::new(history_path.clone());

    let result = match outcome {
        NavigationOutcome::Success { extracted_data } => TaskResult::success(
            run_id,
            store.path().display().to_string(),
            history_path.display().to_string(),
            elapsed,
            false,
            extracted_data,
        ),
        NavigationOutcome::Failure { error } => TaskResult::failure(run_id, &error, elapsed),
        NavigationOutcome::Cancelled => TaskResult::failure(
            run_id,
            &OrchestratorError::task_execution("navigation run was cancelled"),
            elapsed,
        ),
    };

    if let Err(err) = history_store.add_ai_run(task_id, &result) {
        warn!(task_id = %task_id, error = %err, "orchestrator: failed to record run history (not masking task outcome)");
    }

    result
}
