//! Navigation Loop (C4): the perceive → decide → enrich & record →
//! execute → budget cycle (§4.4), grounded in the teacher's
//! `agent-core::agent_loop::controller::AgentLoopController`.

use std::collections::BTreeMap;
use std::sync::Arc;

use soulbrowser_core_types::{
    BrowserController, ErrorContext, LlmClient, LlmDecision, OrchestratorError,
    OrchestratorResult, SecretMap,
};
use tracing::{info, warn};
use traversal_store::TraversalStore;

use crate::cancellation::CancellationToken;
use crate::config::NavigationLoopConfig;
use crate::executor::{execute_action, ActionEffect};
use crate::prompt::{render_dom_summary, resolve_extracted_data};

/// How one navigation run ended, handed back to whichever caller started
/// it — `orchestrator` for a top-level `navigate`, `replay-healing` for a
/// healing sub-run (§4.5 step 3).
#[derive(Debug)]
pub enum NavigationOutcome {
    Success {
        extracted_data: BTreeMap<String, String>,
    },
    Failure {
        error: OrchestratorError,
    },
    Cancelled,
}

/// Everything the loop needs to drive one run, gathered in one place the
/// way the teacher's `AgentLoopController` bundles its observe/decide/act
/// callbacks into one struct rather than threading them as bare closures.
pub struct NavigationLoop {
    pub browser: Arc<dyn BrowserController>,
    pub llm: Arc<dyn LlmClient>,
    pub secrets: SecretMap,
    pub config: NavigationLoopConfig,
    pub cancellation: CancellationToken,
}

impl NavigationLoop {
    pub fn new(
        browser: Arc<dyn BrowserController>,
        llm: Arc<dyn LlmClient>,
        secrets: SecretMap,
        config: NavigationLoopConfig,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            browser,
            llm,
            secrets,
            config,
            cancellation,
        }
    }

    /// Run the loop to completion against `store`, which already holds
    /// the traversal metadata (§4.3 `start`). `goal` is the natural
    /// language task; `extra_instructions` and `output_schema` come from
    /// the same task configuration the traversal was started with.
    pub async fn run(
        &self,
        goal: &str,
        extra_instructions: &[String],
        output_schema: &BTreeMap<String, String>,
        store: &mut TraversalStore,
    ) -> NavigationOutcome {
        let mut memory = String::new();
        let mut step: u32 = 0;

        loop {
            if self.cancellation.is_cancelled() {
                return self.finish_cancelled(store);
            }

            step += 1;
            if step > self.config.max_steps {
                let error = OrchestratorError::task_execution(format!(
                    "budget exhausted after {} steps without a done action",
                    self.config.max_steps
                ))
                .with_context(ErrorContext::new().with_task(goal).with_step(step));
                return self.finish_failure(store, error);
            }

            let summary = match self.browser.dump_dom_summary().await {
                Ok(summary) => summary,
                Err(error) => return self.finish_failure(store, error),
            };

            let decision = match self
                .decide_with_retry(goal, &memory, extra_instructions, &summary, step)
                .await
            {
                Ok(decision) => decision,
                Err(error) => return self.finish_failure(store, error),
            };
            memory = decision.current_state.memory.clone();

            let brain_state_id = decision.current_state.id.clone();
            if let Err(error) = store.append_brain_state(decision.current_state) {
                return self.finish_failure(store, store_error_to_orchestrator(error));
            }

            let actions: Vec<_> = decision
                .action
                .into_iter()
                .take(self.config.max_actions_per_step as usize)
                .collect();
            let enriched = action_enricher::enrich_actions(&actions, &summary, &brain_state_id);

            for (action, extended) in actions.iter().zip(enriched.into_iter()) {
                if self.cancellation.is_cancelled() {
                    return self.finish_cancelled(store);
                }

                if let Err(error) = store.append_action(extended) {
                    return self.finish_failure(store, store_error_to_orchestrator(error));
                }

                match execute_action(&self.browser, &self.secrets, &summary, action).await {
                    Ok(ActionEffect::Continued) => {}
                    Ok(ActionEffect::Done { success, text }) => {
                        let extracted = resolve_extracted_data(output_schema, text.as_deref());
                        if extracted.is_empty() && !output_schema.is_empty() {
                            warn!(run_id = %store.run_id(), "done action did not yield any extracted data matching the output schema");
                        }
                        return if success {
                            self.finish_success(store, extracted)
                        } else {
                            let error = OrchestratorError::task_execution(
                                "task reported done with success=false",
                            )
                            .with_context(ErrorContext::new().with_task(goal).with_step(step));
                            self.finish_failure(store, error)
                        };
                    }
                    Err(error) => return self.finish_failure(store, error),
                }
            }

            info!(run_id = %store.run_id(), step, "navigation loop: step complete");
        }
    }

    /// §7 propagation policy: an unparseable structured response is a
    /// transient failure, retried up to `llm_parse_retry_limit` times
    /// with the same request before surfacing as `llm_error`.
    async fn decide_with_retry(
        &self,
        goal: &str,
        memory: &str,
        extra_instructions: &[String],
        summary: &soulbrowser_core_types::BrowserStateSummary,
        step: u32,
    ) -> OrchestratorResult<LlmDecision> {
        let request = soulbrowser_core_types::DecisionRequest {
            goal: goal.to_string(),
            memory: memory.to_string(),
            dom_summary_text: render_dom_summary(summary),
            extra_instructions: extra_instructions.to_vec(),
            system_prompt: system_prompt(),
        };

        let mut attempt = 0;
        loop {
            match self.llm.complete_structured(&request).await {
                Ok(decision) => return Ok(decision),
                Err(error) if attempt < self.config.llm_parse_retry_limit => {
                    attempt += 1;
                    warn!(step, attempt, error = %error, "navigation loop: retrying llm decision");
                }
                Err(error) => {
                    return Err(error.with_context(
                        ErrorContext::new()
                            .with_task(goal)
                            .with_step(step)
                            .with_suggestion("check the LLM provider and retry"),
                    ));
                }
            }
        }
    }

    fn finish_success(
        &self,
        store: &mut TraversalStore,
        extracted_data: BTreeMap<String, String>,
    ) -> NavigationOutcome {
        if let Err(error) = store.set_extracted(extracted_data.clone()) {
            return self.finish_failure(store, store_error_to_orchestrator(error));
        }
        let _ = store.seal(soulbrowser_core_types::TraversalStatus::Success);
        NavigationOutcome::Success { extracted_data }
    }

    fn finish_failure(
        &self,
        store: &mut TraversalStore,
        error: OrchestratorError,
    ) -> NavigationOutcome {
        let _ = store.seal(soulbrowser_core_types::TraversalStatus::Failed);
        NavigationOutcome::Failure { error }
    }

    fn finish_cancelled(&self, store: &mut TraversalStore) -> NavigationOutcome {
        let _ = store.seal(soulbrowser_core_types::TraversalStatus::Cancelled);
        NavigationOutcome::Cancelled
    }
}

/// `TraversalStoreError` only carries an `OrchestratorError` for the
/// invariant-violation case (`Invariant(#[from] ..)`); everything else
/// (serialize/io/read/parse failures) is a lower-level durability
/// problem that the loop reports as a task-execution error rather than
/// unwrapping the variant, since those kinds don't otherwise exist in
/// the closed §7 taxonomy.
fn store_error_to_orchestrator(error: traversal_store::TraversalStoreError) -> OrchestratorError {
    match error {
        traversal_store::TraversalStoreError::Invariant(inner) => inner,
        other => OrchestratorError::task_execution(other.to_string()),
    }
}

fn system_prompt() -> String {
    "You control a web browser one step at a time. Given the goal, your \
     memory and the current page's indexed elements, reply with your \
     assessment and the next batch of actions to take."
        .to_string()
}

/// Re-exported so this module's own tests (and downstream crates) can
/// build an [`LlmDecision`]'s `current_state` without a separate
/// `core-types` import just for this one type.
pub use soulbrowser_core_types::BrainState;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBrowserController, FakeLlmClient};
    use soulbrowser_core_types::{
        ActionKind, BrainStateId, BrowserConfig, BrowserStateSummary, DomNode, RunId,
    };
    use traversal_store::TraversalMeta;

    fn summary_with_button() -> BrowserStateSummary {
        let mut selector_map = BTreeMap::new();
        selector_map.insert(
            0,
            DomNode {
                tag_name: "button".to_string(),
                attributes: BTreeMap::new(),
                xpath: "/html/body/button[1]".to_string(),
                text: Some("Submit".to_string()),
                is_visible: true,
                is_enabled: true,
                bounding_box: None,
            },
        );
        BrowserStateSummary {
            url: "https://example.org/form".to_string(),
            title: "Form".to_string(),
            tabs: vec![],
            selector_map,
            html: "<html><body><button id=\"go\">Submit</button></body></html>".to_string(),
            pixels_above: 0,
            pixels_below: 0,
            screenshot_base64: None,
        }
    }

    fn decision(done: bool) -> LlmDecision {
        LlmDecision {
            current_state: BrainState {
                id: BrainStateId::from_ordinal(1),
                evaluation_previous_goal: "n/a".to_string(),
                memory: "clicked submit".to_string(),
                next_goal: "finish".to_string(),
            },
            action: if done {
                vec![ActionKind::Done {
                    success: true,
                    text: Some("done".to_string()),
                }]
            } else {
                vec![ActionKind::ClickElementByIndex { index: 0 }]
            },
        }
    }

    fn store(dir: &std::path::Path) -> TraversalStore {
        TraversalStore::start(
            dir,
            RunId::new(),
            TraversalMeta {
                test_case: "submit the form".to_string(),
                extra_instructions: vec![],
                browser_config: BrowserConfig::desktop_default(),
                secret_names: vec![],
                io_schema: None,
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn done_action_seals_success_and_stops_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());
        let browser = Arc::new(FakeBrowserController::new(vec![summary_with_button()]));
        let llm = Arc::new(FakeLlmClient::new(vec![Ok(decision(true))]));
        let navigation = NavigationLoop::new(
            browser,
            llm,
            SecretMap::new(),
            NavigationLoopConfig::default(),
            CancellationToken::new(),
        );
        let outcome = navigation.run("submit the form", &[], &BTreeMap::new(), &mut store).await;
        assert!(matches!(outcome, NavigationOutcome::Success { .. }));
        assert_eq!(store.traversal().status, soulbrowser_core_types::TraversalStatus::Success);
    }

    #[tokio::test]
    async fn budget_exhaustion_seals_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());
        let browser = Arc::new(FakeBrowserController::new(vec![summary_with_button()]));
        let decisions: Vec<_> = (0..3).map(|_| Ok(decision(false))).collect();
        let llm = Arc::new(FakeLlmClient::new(decisions));
        let mut config = NavigationLoopConfig::default();
        config.max_steps = 2;
        let navigation = NavigationLoop::new(
            browser,
            llm,
            SecretMap::new(),
            config,
            CancellationToken::new(),
        );
        let outcome = navigation.run("submit the form", &[], &BTreeMap::new(), &mut store).await;
        match outcome {
            NavigationOutcome::Failure { error } => assert_eq!(error.kind_name(), "task_execution_error"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancellation_between_steps_seals_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());
        let browser = Arc::new(FakeBrowserController::new(vec![summary_with_button()]));
        let llm = Arc::new(FakeLlmClient::new(vec![Ok(decision(false))]));
        let cancellation = CancellationToken::new();
        cancellation.cancel();
        let navigation = NavigationLoop::new(
            browser,
            llm,
            SecretMap::new(),
            NavigationLoopConfig::default(),
            cancellation,
        );
        let outcome = navigation.run("submit the form", &[], &BTreeMap::new(), &mut store).await;
        assert!(matches!(outcome, NavigationOutcome::Cancelled));
    }

    #[tokio::test]
    async fn unparseable_decision_is_retried_before_surfacing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());
        let browser = Arc::new(FakeBrowserController::new(vec![summary_with_button()]));
        let llm = Arc::new(FakeLlmClient::new(vec![
            Err(OrchestratorError::llm("unparseable response")),
            Ok(decision(true)),
        ]));
        let navigation = NavigationLoop::new(
            browser,
            llm,
            SecretMap::new(),
            NavigationLoopConfig::default(),
            CancellationToken::new(),
        );
        let outcome = navigation.run("submit the form", &[], &BTreeMap::new(), &mut store).await;
        assert!(matches!(outcome, NavigationOutcome::Success { .. }));
    }
}
