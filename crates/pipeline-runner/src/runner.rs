//! Execute phase (§4.6 steps 4-6): drive each node's Navigation Loop in
//! topological order, merging parent outputs into runtime inputs,
//! enforcing the schema/secret collision and required-input checks,
//! and recording run-history on completion.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use soulbrowser_core_types::{
    BrowserConfig, IoSchema, LlmClient, NodeId, OrchestratorError, RunId, SecretMap, TaskId,
    TaskResult,
};
use tracing::{info, warn};
use traversal_store::{TraversalMeta, TraversalStore};

use navigation_loop::{CancellationToken, NavigationLoop, NavigationLoopConfig, NavigationOutcome};
use run_history::RunHistoryStore;

use crate::client_factory::ClientStrategy;
use crate::plan::{ExecutionPlan, ResolvedNode};

/// Per-node outcome plus the topological order they ran in, so a caller
/// can read results either by node id or in execution order.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    pub order: Vec<NodeId>,
    pub results: BTreeMap<NodeId, TaskResult>,
}

impl PipelineOutcome {
    /// The original's `BulkBugninjaTaskResult` view: every result, in
    /// execution order.
    pub fn bulk(&self) -> soulbrowser_core_types::BulkResult {
        let mut bulk = soulbrowser_core_types::BulkResult::default();
        for id in &self.order {
            if let Some(result) = self.results.get(id) {
                bulk.push(result.clone());
            }
        }
        bulk
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.values().all(|r| r.success)
    }
}

/// Drives the execute phase of the Pipeline DAG Runner (C6).
pub struct PipelineRunner {
    pub llm: Arc<dyn LlmClient>,
    pub clients: ClientStrategy,
    pub loop_config: NavigationLoopConfig,
    /// Traversals land under `<traversal_base_dir>/<node_id>/`.
    pub traversal_base_dir: PathBuf,
    /// Run-history files land under `<history_base_dir>/<node_id>/run_history.json`.
    pub history_base_dir: PathBuf,
}

impl PipelineRunner {
    /// Execute every node of `plan` in its topological order. Returns on
    /// the first node failure (§4.6 execute phase: "On failure, the
    /// pipeline aborts") — completed nodes' artifacts are left intact
    /// (§7 "Pipeline-level failures report which node failed and leave
    /// completed nodes' artifacts intact").
    pub async fn run_plan(
        &self,
        plan: &ExecutionPlan,
        secrets_by_node: &BTreeMap<NodeId, SecretMap>,
    ) -> Result<PipelineOutcome, (OrchestratorError, PipelineOutcome)> {
        let mut produced: BTreeMap<NodeId, BTreeMap<String, String>> = BTreeMap::new();
        let mut outcome = PipelineOutcome {
            order: plan.order.clone(),
            results: BTreeMap::new(),
        };

        for node_id in &plan.order {
            let node = plan.node(node_id);

            let runtime_inputs = match merge_parent_outputs(node, &produced) {
                Ok(inputs) => inputs,
                Err(error) => return Err((error, outcome)),
            };
            if let Err(error) = check_schema_secret_collision(node) {
                return Err((error, outcome));
            }
            if let Err(error) = check_required_inputs(node, &runtime_inputs) {
                return Err((error, outcome));
            }

            match self.execute_node(node_id, node, &runtime_inputs, secrets_by_node).await {
                Ok((result, extracted)) => {
                    produced.insert(node_id.clone(), extracted);
                    outcome.results.insert(node_id.clone(), result);
                }
                Err(error) => return Err((error, outcome)),
            }
        }

        Ok(outcome)
    }

    async fn execute_node(
        &self,
        node_id: &NodeId,
        node: &ResolvedNode,
        runtime_inputs: &BTreeMap<String, String>,
        secrets_by_node: &BTreeMap<NodeId, SecretMap>,
    ) -> Result<(TaskResult, BTreeMap<String, String>), OrchestratorError> {
        let secrets = secrets_by_node.get(node_id).cloned().unwrap_or_default();
        let browser = self.clients.obtain(node_id, &node.spec).await?;

        let run_id = RunId::new();
        let traversal_dir = self.traversal_base_dir.join(&node_id.0);
        std::fs::create_dir_all(&traversal_dir).map_err(|err| {
            OrchestratorError::task_execution(format!("failed to create traversal dir: {err}"))
        })?;

        let browser_config = BrowserConfig {
            allowed_domains: node.spec.allowed_domains.clone(),
            ..BrowserConfig::desktop_default()
        };
        let extra_instructions = with_runtime_input_instructions(&node.spec.extra_instructions, runtime_inputs);

        let mut store = TraversalStore::start(
            &traversal_dir,
            run_id.clone(),
            TraversalMeta {
                test_case: node.spec.test_case.clone(),
                extra_instructions: extra_instructions.clone(),
                browser_config,
                secret_names: node.spec.secret_names.clone(),
                io_schema: Some(IoSchema {
                    input_schema: node.spec.input_schema.clone(),
                    output_schema: node.spec.output_schema.clone(),
                }),
            },
        )
        .map_err(|err| OrchestratorError::task_execution(err.to_string()))?;

        let mut loop_config = self.loop_config.clone();
        loop_config.max_steps = node.spec.max_steps;

        let navigation = NavigationLoop::new(
            browser,
            self.llm.clone(),
            secrets,
            loop_config,
            CancellationToken::new(),
        );

        info!(node_id = %node_id, run_id = %run_id, "pipeline: executing node");
        let started = Instant::now();
        let nav_outcome = navigation
            .run(
                &node.spec.test_case,
                &extra_instructions,
                &node.spec.output_schema,
                &mut store,
            )
            .await;
        let elapsed = started.elapsed().as_secs_f64();

        let task_id = TaskId(node_id.0.clone());
        let history_path = self.history_base_dir.join(&node_id.0).join("run_history.json");
        if let Some(parent) = history_path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                OrchestratorError::task_execution(format!("failed to create history dir: {err}"))
            })?;
        }
        let history_store = RunHistoryStore::new(history_path.clone());

        match nav_outcome {
            NavigationOutcome::Success { extracted_data } => {
                let result = TaskResult::success(
                    run_id,
                    store.path().display().to_string(),
                    history_path.display().to_string(),
                    elapsed,
                    false,
                    extracted_data.clone(),
                );
                if let Err(err) = history_store.add_ai_run(&task_id, &result) {
                    warn!(node_id = %node_id, error = %err, "pipeline: failed to record run history (not masking task success)");
                }
                Ok((result, extracted_data))
            }
            NavigationOutcome::Failure { error } => {
                let result = TaskResult::failure(run_id, &error, elapsed);
                if let Err(err) = history_store.add_ai_run(&task_id, &result) {
                    warn!(node_id = %node_id, error = %err, "pipeline: failed to record run history for a failed node");
                }
                Err(error)
            }
            NavigationOutcome::Cancelled => {
                let error = OrchestratorError::task_execution("pipeline node run was cancelled");
                let result = TaskResult::failure(run_id, &error, elapsed);
                let _ = history_store.add_ai_run(&task_id, &result);
                Err(error)
            }
        }
    }
}

/// §4.6 execute phase step 1: merge every parent's `extracted_data`
/// restricted to the child's `input_schema` keys; same key with
/// different values from different parents is fatal (Testable
/// Property 5 / E3).
fn merge_parent_outputs(
    node: &ResolvedNode,
    produced: &BTreeMap<NodeId, BTreeMap<String, String>>,
) -> Result<BTreeMap<String, String>, OrchestratorError> {
    let mut merged: BTreeMap<String, String> = BTreeMap::new();
    for parent_id in &node.parents {
        let Some(outputs) = produced.get(parent_id) else {
            continue;
        };
        for (key, value) in outputs {
            if !node.spec.input_schema.contains_key(key) {
                continue;
            }
            if let Some(existing) = merged.get(key) {
                if existing != value {
                    return Err(OrchestratorError::dependency_conflict(format!(
                        "conflicting values for input key '{key}' from multiple parents: \
                         '{existing}' vs '{value}'"
                    )));
                }
            } else {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(merged)
}

/// §4.6 execute phase step 2: no key may appear in both `input_schema`
/// and `secrets`.
fn check_schema_secret_collision(node: &ResolvedNode) -> Result<(), OrchestratorError> {
    let collisions: Vec<&String> = node
        .spec
        .secret_names
        .iter()
        .filter(|name| node.spec.input_schema.contains_key(*name))
        .collect();
    if !collisions.is_empty() {
        return Err(OrchestratorError::validation(format!(
            "node {} has key(s) present in both input_schema and secrets: {:?}",
            node.id, collisions
        )));
    }
    Ok(())
}

/// §4.6 execute phase step 3: every required input key must be present
/// unless the spec came from a persisted config, in which case it's a
/// warning and execution proceeds.
fn check_required_inputs(
    node: &ResolvedNode,
    runtime_inputs: &BTreeMap<String, String>,
) -> Result<(), OrchestratorError> {
    let missing: Vec<&String> = node
        .spec
        .input_schema
        .keys()
        .filter(|key| !runtime_inputs.contains_key(*key))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    if node.spec.from_persisted_config {
        warn!(node_id = %node.id, missing = ?missing, "pipeline: missing required inputs for a persisted-config task, proceeding (LLM may still fill them)");
        return Ok(());
    }
    Err(OrchestratorError::validation(format!(
        "node {} is missing required input key(s): {:?}",
        node.id, missing
    )))
}

fn with_runtime_input_instructions(
    base: &[String],
    runtime_inputs: &BTreeMap<String, String>,
) -> Vec<String> {
    if runtime_inputs.is_empty() {
        return base.to_vec();
    }
    let mut instructions = base.to_vec();
    for (key, value) in runtime_inputs {
        instructions.push(format!("Use this value for input '{key}': {value}"));
    }
    instructions
}
