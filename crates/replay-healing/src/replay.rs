//! §4.5 state machine: `Idle → Replaying → Healing? → Done(success) |
//! Failed(unrecoverable)`. Grounded in the teacher's `agent-core`
//! controller shape (one driving struct, a `run`-style entry point) and
//! `action-locator`'s locate-then-heal flow.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use soulbrowser_core_types::{
    ActionKind, BrainStateId, ErrorContext, LlmClient, BrowserController, OrchestratorError,
    OrchestratorResult, SecretMap, Traversal, TraversalStatus,
};
use tracing::{info, warn};
use traversal_store::{TraversalStore, TraversalStoreError};

use navigation_loop::{
    execute_action, resolve_extracted_data, ActionEffect, CancellationToken, NavigationLoop,
    NavigationLoopConfig, NavigationOutcome,
};

use crate::healer::HealLedger;
use crate::locator::locate;

/// External "continue" signal for `pause_after_each_step` (§4.5 step 4).
/// The default never blocks; a host driving an interactive replay
/// session supplies its own gate.
#[async_trait::async_trait]
pub trait StepGate: Send + Sync {
    async fn wait_for_continue(&self);
}

#[derive(Default)]
pub struct AutoContinue;

#[async_trait::async_trait]
impl StepGate for AutoContinue {
    async fn wait_for_continue(&self) {}
}

#[derive(Clone, Debug)]
pub struct ReplayConfig {
    pub pause_between_actions: Duration,
    pub pause_after_each_step: bool,
    pub enable_healing: bool,
    /// Budget handed to the Navigation Loop for a healing sub-run
    /// (§4.5 healing transition step 3: "a reduced budget").
    pub healing_max_steps: u32,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            pause_between_actions: Duration::from_millis(0),
            pause_after_each_step: false,
            enable_healing: true,
            healing_max_steps: 15,
        }
    }
}

#[derive(Debug)]
pub enum ReplayOutcome {
    Success {
        healing_happened: bool,
        extracted_data: BTreeMap<String, String>,
    },
    Failed {
        error: OrchestratorError,
        healing_happened: bool,
    },
}

/// Drives one replay of a sealed [`Traversal`], appending every copied or
/// healed step into a fresh [`TraversalStore`] (the replay's own
/// traversal record — the original stays read-only).
pub struct ReplayRunner {
    pub browser: Arc<dyn BrowserController>,
    pub llm: Option<Arc<dyn LlmClient>>,
    pub secrets: SecretMap,
    pub gate: Arc<dyn StepGate>,
    pub config: ReplayConfig,
}

impl ReplayRunner {
    pub async fn replay(&self, original: &Traversal, store: &mut TraversalStore) -> ReplayOutcome {
        let heal_ledger = HealLedger::new();
        let mut healing_happened = false;
        let mut appended_brain_states: std::collections::HashSet<BrainStateId> =
            std::collections::HashSet::new();

        for (action_key, extended) in &original.actions {
            if !appended_brain_states.contains(&extended.brain_state_id) {
                let Some(brain_state) = original.brain_states.get(&extended.brain_state_id) else {
                    let error = OrchestratorError::session_replay(format!(
                        "{} references brain state {} absent from the original traversal",
                        action_key, extended.brain_state_id
                    ));
                    return self.finish_failed(store, error, healing_happened);
                };
                if let Err(error) = store.append_brain_state(brain_state.clone()) {
                    return self.finish_failed(store, store_error(error), healing_happened);
                }
                appended_brain_states.insert(extended.brain_state_id.clone());
            }

            let summary = match self.browser.dump_dom_summary().await {
                Ok(summary) => summary,
                Err(error) => return self.finish_failed(store, error, healing_happened),
            };

            let resolved_action = if extended.action.is_selector_oriented() {
                let Some(dom_data) = &extended.dom_element_data else {
                    let error = OrchestratorError::session_replay(format!(
                        "{action_key} is selector-oriented but carries no dom_element_data"
                    ));
                    return self.finish_failed(store, error, healing_happened);
                };
                match locate(&self.browser, &summary, dom_data).await {
                    Ok(Some(outcome)) => {
                        info!(action_key = %action_key, strategy = outcome.strategy.name(), "replay: located element");
                        Some(with_index(&extended.action, outcome.index))
                    }
                    Ok(None) => None,
                    Err(error) => return self.finish_failed(store, error, healing_happened),
                }
            } else {
                Some(extended.action.clone())
            };

            let action = match resolved_action {
                Some(action) => action,
                None => {
                    if !self.config.enable_healing || !heal_ledger.is_available(action_key) {
                        let error = OrchestratorError::session_replay(format!(
                            "could not locate the element {action_key} targeted and healing is unavailable"
                        ))
                        .with_context(ErrorContext::new().with_action_key(action_key.to_string()));
                        return self.finish_failed(store, error, healing_happened);
                    }

                    match self.heal(original, action_key, extended, store).await {
                        Ok(()) => {
                            healing_happened = true;
                            heal_ledger.mark_healed(action_key);
                            // The healing sub-run's own actions already
                            // carry this action's intent; the original
                            // faulty action is superseded, not replayed.
                            self.gate.wait_for_continue().await;
                            continue;
                        }
                        Err(error) => return self.finish_failed(store, error, healing_happened),
                    }
                }
            };

            if let Err(error) = store.append_action(extended.clone()) {
                return self.finish_failed(store, store_error(error), healing_happened);
            }

            match execute_action(&self.browser, &self.secrets, &summary, &action).await {
                Ok(ActionEffect::Continued) => {}
                Ok(ActionEffect::Done { success, text }) => {
                    let output_schema = original
                        .io_schema
                        .as_ref()
                        .map(|schema| schema.output_schema.clone())
                        .unwrap_or_default();
                    let extracted = resolve_extracted_data(&output_schema, text.as_deref());
                    return if success {
                        self.finish_success(store, extracted, healing_happened)
                    } else {
                        let error = OrchestratorError::session_replay(
                            "replayed task reported done with success=false",
                        );
                        self.finish_failed(store, error, healing_happened)
                    };
                }
                Err(error) => return self.finish_failed(store, error, healing_happened),
            }

            if !self.config.pause_between_actions.is_zero() {
                tokio::time::sleep(self.config.pause_between_actions).await;
            }
            if self.config.pause_after_each_step {
                self.gate.wait_for_continue().await;
            }
        }

        self.finish_success(store, original.extracted_data.clone(), healing_happened)
    }

    /// §4.5 healing transition: hand control to the Navigation Loop with
    /// a reduced budget; its new brain states/actions are appended
    /// directly into `store` (the splice), so the caller only needs to
    /// know whether the sub-run reached `done`.
    async fn heal(
        &self,
        original: &Traversal,
        action_key: &soulbrowser_core_types::ActionKey,
        extended: &soulbrowser_core_types::ExtendedAction,
        store: &mut TraversalStore,
    ) -> OrchestratorResult<()> {
        let Some(llm) = self.llm.clone() else {
            return Err(OrchestratorError::configuration(
                "healing is enabled but no LLM client was configured",
            ));
        };

        let next_goal = original
            .brain_states
            .get(&extended.brain_state_id)
            .map(|bs| bs.next_goal.clone())
            .unwrap_or_default();
        let healing_goal = format!(
            "{}\n\nResume this task: the recorded action {action_key} ({}) could no longer be \
             located on the page. The next intended goal was: {next_goal}",
            original.test_case,
            extended.action.kind_name(),
        );

        let navigation = NavigationLoop::new(
            self.browser.clone(),
            llm,
            self.secrets.clone(),
            NavigationLoopConfig::default().reduced_for_healing(self.config.healing_max_steps),
            CancellationToken::new(),
        );

        let output_schema = original
            .io_schema
            .as_ref()
            .map(|schema| schema.output_schema.clone())
            .unwrap_or_default();
        let outcome = navigation
            .run(&healing_goal, &original.extra_instructions, &output_schema, store)
            .await;

        match outcome {
            NavigationOutcome::Success { .. } => {
                warn!(action_key = %action_key, "replay: healed via navigation sub-run");
                Ok(())
            }
            NavigationOutcome::Failure { error } => Err(error),
            NavigationOutcome::Cancelled => Err(OrchestratorError::session_replay(
                "healing sub-run was cancelled before reaching done",
            )),
        }
    }

    fn finish_success(
        &self,
        store: &mut TraversalStore,
        extracted_data: BTreeMap<String, String>,
        healing_happened: bool,
    ) -> ReplayOutcome {
        let _ = store.set_extracted(extracted_data.clone());
        let _ = store.seal(TraversalStatus::Success);
        ReplayOutcome::Success {
            healing_happened,
            extracted_data,
        }
    }

    fn finish_failed(
        &self,
        store: &mut TraversalStore,
        error: OrchestratorError,
        healing_happened: bool,
    ) -> ReplayOutcome {
        let _ = store.seal(TraversalStatus::Failed);
        ReplayOutcome::Failed {
            error,
            healing_happened,
        }
    }
}

fn store_error(error: TraversalStoreError) -> OrchestratorError {
    match error {
        TraversalStoreError::Invariant(inner) => inner,
        other => OrchestratorError::task_execution(other.to_string()),
    }
}

/// Substitute a freshly located index into a selector-oriented action,
/// leaving the recorded action's other parameters untouched.
fn with_index(action: &ActionKind, index: u32) -> ActionKind {
    match action {
        ActionKind::ClickElementByIndex { .. } => ActionKind::ClickElementByIndex { index },
        ActionKind::InputText { text, .. } => ActionKind::InputText {
            index,
            text: text.clone(),
        },
        ActionKind::GetDropdownOptions { .. } => ActionKind::GetDropdownOptions { index },
        ActionKind::SelectDropdownOption { value, .. } => ActionKind::SelectDropdownOption {
            index,
            value: value.clone(),
        },
        ActionKind::DragDrop { target_index, .. } => ActionKind::DragDrop {
            index,
            target_index: *target_index,
        },
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navigation_loop::testing::{FakeBrowserController, FakeLlmClient};
    use soulbrowser_core_types::{
        BrainState, BrainStateId, BrowserConfig, BrowserStateSummary, DomElementData, DomNode,
        ExtendedAction, LlmDecision, RunId,
    };
    use traversal_store::TraversalMeta;

    fn meta() -> TraversalMeta {
        TraversalMeta {
            test_case: "submit the form".to_string(),
            extra_instructions: vec![],
            browser_config: BrowserConfig::desktop_default(),
            secret_names: vec![],
            io_schema: None,
        }
    }

    fn empty_summary() -> BrowserStateSummary {
        BrowserStateSummary {
            url: "https://example.org".to_string(),
            title: "Example".to_string(),
            tabs: vec![],
            selector_map: Default::default(),
            html: String::new(),
            pixels_above: 0,
            pixels_below: 0,
            screenshot_base64: None,
        }
    }

    fn runner(
        browser: Arc<dyn BrowserController>,
        llm: Option<Arc<dyn LlmClient>>,
        enable_healing: bool,
    ) -> ReplayRunner {
        ReplayRunner {
            browser,
            llm,
            secrets: SecretMap::new(),
            gate: Arc::new(AutoContinue),
            config: ReplayConfig {
                enable_healing,
                healing_max_steps: 5,
                ..ReplayConfig::default()
            },
        }
    }

    #[tokio::test]
    async fn non_selector_actions_replay_to_success() {
        let mut original = Traversal::new("submit the form", vec![], BrowserConfig::desktop_default(), vec![], None);
        original
            .append_brain_state(BrainState {
                id: BrainStateId::from_ordinal(1),
                evaluation_previous_goal: "n/a".to_string(),
                memory: String::new(),
                next_goal: "finish".to_string(),
            })
            .unwrap();
        original
            .append_action(ExtendedAction {
                brain_state_id: BrainStateId::from_ordinal(1),
                action: ActionKind::Done {
                    success: true,
                    text: None,
                },
                dom_element_data: None,
                screenshot_filename: None,
            })
            .unwrap();

        let browser: Arc<dyn BrowserController> =
            Arc::new(FakeBrowserController::new(vec![empty_summary()]));
        let dir = tempfile::tempdir().unwrap();
        let mut store = TraversalStore::start(dir.path(), RunId::new(), meta()).unwrap();

        let outcome = runner(browser, None, false).replay(&original, &mut store).await;
        assert!(matches!(outcome, ReplayOutcome::Success { healing_happened: false, .. }));
    }

    #[tokio::test]
    async fn selector_action_relocated_via_alternative_xpath() {
        let mut original = Traversal::new("submit the form", vec![], BrowserConfig::desktop_default(), vec![], None);
        original
            .append_brain_state(BrainState {
                id: BrainStateId::from_ordinal(1),
                evaluation_previous_goal: "n/a".to_string(),
                memory: String::new(),
                next_goal: "finish".to_string(),
            })
            .unwrap();
        original
            .append_action(ExtendedAction {
                brain_state_id: BrainStateId::from_ordinal(1),
                action: ActionKind::ClickElementByIndex { index: 0 },
                dom_element_data: Some(DomElementData {
                    tag_name: "button".to_string(),
                    attributes: BTreeMap::from([("id".to_string(), "go".to_string())]),
                    xpath: "/html/body/div[9]/button[1]".to_string(),
                    alternative_relative_xpaths: vec!["//button[@id='go']".to_string()],
                    bounding_box: None,
                }),
                screenshot_filename: None,
            })
            .unwrap();
        original
            .append_action(ExtendedAction {
                brain_state_id: BrainStateId::from_ordinal(1),
                action: ActionKind::Done {
                    success: true,
                    text: None,
                },
                dom_element_data: None,
                screenshot_filename: None,
            })
            .unwrap();

        let mut summary = empty_summary();
        summary.selector_map.insert(
            5,
            DomNode {
                tag_name: "button".to_string(),
                attributes: BTreeMap::from([("id".to_string(), "go".to_string())]),
                xpath: "/html/body/button[1]".to_string(),
                text: Some("Go".to_string()),
                is_visible: true,
                is_enabled: true,
                bounding_box: None,
            },
        );
        let fake = Arc::new(FakeBrowserController::new(vec![summary]));
        let browser: Arc<dyn BrowserController> = fake.clone();
        let dir = tempfile::tempdir().unwrap();
        let mut store = TraversalStore::start(dir.path(), RunId::new(), meta()).unwrap();

        let outcome = runner(browser, None, false).replay(&original, &mut store).await;
        assert!(matches!(outcome, ReplayOutcome::Success { healing_happened: false, .. }));
        assert!(fake.calls().iter().any(|call| call == "click:5"));
    }

    #[tokio::test]
    async fn locator_miss_without_healing_fails() {
        let mut original = Traversal::new("submit the form", vec![], BrowserConfig::desktop_default(), vec![], None);
        original
            .append_brain_state(BrainState {
                id: BrainStateId::from_ordinal(1),
                evaluation_previous_goal: "n/a".to_string(),
                memory: String::new(),
                next_goal: "finish".to_string(),
            })
            .unwrap();
        original
            .append_action(ExtendedAction {
                brain_state_id: BrainStateId::from_ordinal(1),
                action: ActionKind::ClickElementByIndex { index: 0 },
                dom_element_data: Some(DomElementData {
                    tag_name: "button".to_string(),
                    attributes: BTreeMap::new(),
                    xpath: "/html/body/button[1]".to_string(),
                    alternative_relative_xpaths: vec![],
                    bounding_box: None,
                }),
                screenshot_filename: None,
            })
            .unwrap();

        let browser: Arc<dyn BrowserController> =
            Arc::new(FakeBrowserController::new(vec![empty_summary()]));
        let dir = tempfile::tempdir().unwrap();
        let mut store = TraversalStore::start(dir.path(), RunId::new(), meta()).unwrap();

        let outcome = runner(browser, None, false).replay(&original, &mut store).await;
        match outcome {
            ReplayOutcome::Failed { error, healing_happened } => {
                assert_eq!(error.kind_name(), "session_replay_error");
                assert!(!healing_happened);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn locator_miss_with_healing_enabled_invokes_navigation_sub_run() {
        let mut original = Traversal::new("submit the form", vec![], BrowserConfig::desktop_default(), vec![], None);
        original
            .append_brain_state(BrainState {
                id: BrainStateId::from_ordinal(1),
                evaluation_previous_goal: "n/a".to_string(),
                memory: String::new(),
                next_goal: "click the missing button".to_string(),
            })
            .unwrap();
        original
            .append_action(ExtendedAction {
                brain_state_id: BrainStateId::from_ordinal(1),
                action: ActionKind::ClickElementByIndex { index: 0 },
                dom_element_data: Some(DomElementData {
                    tag_name: "button".to_string(),
                    attributes: BTreeMap::new(),
                    xpath: "/html/body/button[1]".to_string(),
                    alternative_relative_xpaths: vec![],
                    bounding_box: None,
                }),
                screenshot_filename: None,
            })
            .unwrap();

        let browser: Arc<dyn BrowserController> =
            Arc::new(FakeBrowserController::new(vec![empty_summary()]));
        let healing_decision = LlmDecision {
            current_state: BrainState {
                id: BrainStateId::from_ordinal(99),
                evaluation_previous_goal: "n/a".to_string(),
                memory: "healed".to_string(),
                next_goal: "done".to_string(),
            },
            action: vec![ActionKind::Done {
                success: true,
                text: None,
            }],
        };
        let llm: Arc<dyn LlmClient> = Arc::new(FakeLlmClient::new(vec![Ok(healing_decision)]));
        let dir = tempfile::tempdir().unwrap();
        let mut store = TraversalStore::start(dir.path(), RunId::new(), meta()).unwrap();

        let outcome = runner(browser, Some(llm), true).replay(&original, &mut store).await;
        assert!(matches!(outcome, ReplayOutcome::Success { healing_happened: true, .. }));
        assert!(store
            .traversal()
            .brain_states
            .contains_key(&BrainStateId::from_ordinal(99)));
    }
}
