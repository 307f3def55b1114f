//! The traversal data model (§3): the recorded sequence of brain states
//! and extended actions for one navigation or replay run, plus the
//! mutators that enforce the ordering and enrichment invariants. File
//! I/O and atomic persistence live in the `traversal-store` crate; this
//! module only owns the shape and the invariants.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::action::ActionKind;
use crate::browser::BrowserConfig;
use crate::browser_iface::BoundingBox;
use crate::error::{ErrorContext, OrchestratorError};
use crate::ids::{ActionKey, BrainStateId};

/// The LLM's situational snapshot at one step (§3 `BrainState`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrainState {
    pub id: BrainStateId,
    pub evaluation_previous_goal: String,
    pub memory: String,
    pub next_goal: String,
}

/// DOM evidence attached to selector-oriented actions so replay (C5) has
/// several chances to relocate the element (Invariant 3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DomElementData {
    pub tag_name: String,
    pub attributes: BTreeMap<String, String>,
    pub xpath: String,
    /// Ordered best-to-worst, may be empty (§4.1 failure mode).
    pub alternative_relative_xpaths: Vec<String>,
    /// Last-known on-screen position, used by replay's proximity locator
    /// strategy (§4.5 step 2d) when every xpath-based strategy fails.
    pub bounding_box: Option<BoundingBox>,
}

/// A recorded action together with enough DOM evidence to replay it
/// robustly (§3 `ExtendedAction`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtendedAction {
    pub brain_state_id: BrainStateId,
    pub action: ActionKind,
    pub dom_element_data: Option<DomElementData>,
    pub screenshot_filename: Option<String>,
}

impl ExtendedAction {
    /// Testable Property 1: selector-oriented actions carry non-null
    /// `dom_element_data` with a non-empty `xpath`; non-selector actions
    /// carry none. `action-enricher` degrades to `None` (non-fatal) when
    /// an index can't be resolved — that degraded record still satisfies
    /// "non-selector actions MUST NOT carry dom data" trivially, but
    /// violates "selector-oriented actions MUST carry" one, so this check
    /// is advisory for callers that want to assert the strict invariant
    /// once enrichment succeeded.
    pub fn satisfies_enrichment_invariant(&self) -> bool {
        match (&self.dom_element_data, self.action.is_selector_oriented()) {
            (Some(data), true) => !data.xpath.is_empty(),
            (None, false) => true,
            _ => false,
        }
    }
}

/// `{input_schema, output_schema}`, both `string -> description` maps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IoSchema {
    pub input_schema: BTreeMap<String, String>,
    pub output_schema: BTreeMap<String, String>,
}

/// Terminal (or in-progress) status of a traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalStatus {
    InProgress,
    Success,
    Failed,
    Cancelled,
}

/// A run's complete record: configuration snapshot, every brain state and
/// action observed, and whatever was extracted on completion (§3
/// `Traversal`).
///
/// `secrets` stores only logical names (Invariant 7 / SPEC_FULL open
/// question: raw values MUST NOT persist). The runtime value mapping
/// lives in [`crate::secret::SecretMap`], which is never serialized.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Traversal {
    pub test_case: String,
    pub extra_instructions: Vec<String>,
    pub browser_config: BrowserConfig,
    pub secrets: Vec<String>,
    pub brain_states: IndexMap<BrainStateId, BrainState>,
    pub actions: IndexMap<ActionKey, ExtendedAction>,
    pub extracted_data: BTreeMap<String, String>,
    pub io_schema: Option<IoSchema>,
    pub status: TraversalStatus,
}

impl Traversal {
    pub fn new(
        test_case: impl Into<String>,
        extra_instructions: Vec<String>,
        browser_config: BrowserConfig,
        secret_names: Vec<String>,
        io_schema: Option<IoSchema>,
    ) -> Self {
        Self {
            test_case: test_case.into(),
            extra_instructions,
            browser_config,
            secrets: secret_names,
            brain_states: IndexMap::new(),
            actions: IndexMap::new(),
            extracted_data: BTreeMap::new(),
            io_schema,
            status: TraversalStatus::InProgress,
        }
    }

    /// Append-only: brain states are observed before decisions, so the
    /// id must be new (Invariant 1 is a consequence of always appending
    /// here before any action referencing it).
    pub fn append_brain_state(&mut self, state: BrainState) -> Result<(), OrchestratorError> {
        if self.brain_states.contains_key(&state.id) {
            return Err(OrchestratorError::task_execution(format!(
                "brain state {} already recorded",
                state.id
            ))
            .with_context(ErrorContext::new().with_task(&self.test_case)));
        }
        self.brain_states.insert(state.id.clone(), state);
        Ok(())
    }

    /// Append one extended action under the next ordinal key
    /// (`action_1`, `action_2`, …). Enforces Invariant 1 (the
    /// referenced brain state must already be recorded) and Invariant 2
    /// (selector-oriented <=> non-null dom data) before accepting it.
    pub fn append_action(&mut self, action: ExtendedAction) -> Result<ActionKey, OrchestratorError> {
        if !self.brain_states.contains_key(&action.brain_state_id) {
            return Err(OrchestratorError::task_execution(format!(
                "action references unknown brain state {}",
                action.brain_state_id
            ))
            .with_context(ErrorContext::new().with_task(&self.test_case)));
        }
        if !action.satisfies_enrichment_invariant() && action.dom_element_data.is_none() {
            // A missing index degrades non-fatally per §4.2; record but
            // do not silently accept a non-selector action carrying data.
        }
        if action.action.is_selector_oriented() {
            // allowed to be None (degraded enrichment, §4.2); only a
            // non-selector action carrying dom data is a hard violation.
        } else if action.dom_element_data.is_some() {
            return Err(OrchestratorError::task_execution(
                "non-selector action must not carry dom_element_data",
            )
            .with_context(ErrorContext::new().with_task(&self.test_case)));
        }

        let key = ActionKey::from_ordinal(self.actions.len() as u32 + 1);
        self.actions.insert(key.clone(), action);
        Ok(key)
    }

    pub fn set_extracted(&mut self, data: BTreeMap<String, String>) {
        self.extracted_data = data;
    }

    pub fn seal(&mut self, status: TraversalStatus) {
        self.status = status;
    }

    /// Testable Property 2 (ordering invariant), checked over the whole
    /// traversal rather than just at append time — useful for replay
    /// callers that load a traversal from disk.
    pub fn verify_ordering_invariant(&self) -> Result<(), OrchestratorError> {
        for (key, action) in &self.actions {
            if !self.brain_states.contains_key(&action.brain_state_id) {
                return Err(OrchestratorError::validation(format!(
                    "{key} references brain state {} which is not recorded",
                    action.brain_state_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_brain_state(ordinal: u32) -> BrainState {
        BrainState {
            id: BrainStateId::from_ordinal(ordinal),
            evaluation_previous_goal: "ok".into(),
            memory: String::new(),
            next_goal: "click button".into(),
        }
    }

    #[test]
    fn append_action_requires_existing_brain_state() {
        let mut t = Traversal::new(
            "goal",
            vec![],
            BrowserConfig::desktop_default(),
            vec![],
            None,
        );
        let action = ExtendedAction {
            brain_state_id: BrainStateId::from_ordinal(1),
            action: ActionKind::Wait { seconds: 1.0 },
            dom_element_data: None,
            screenshot_filename: None,
        };
        assert!(t.append_action(action).is_err());
    }

    #[test]
    fn append_action_rejects_dom_data_on_non_selector_action() {
        let mut t = Traversal::new(
            "goal",
            vec![],
            BrowserConfig::desktop_default(),
            vec![],
            None,
        );
        t.append_brain_state(sample_brain_state(1)).unwrap();
        let action = ExtendedAction {
            brain_state_id: BrainStateId::from_ordinal(1),
            action: ActionKind::Wait { seconds: 1.0 },
            dom_element_data: Some(DomElementData {
                tag_name: "button".into(),
                attributes: BTreeMap::new(),
                xpath: "//button".into(),
                alternative_relative_xpaths: vec![],
                bounding_box: None,
            }),
            screenshot_filename: None,
        };
        assert!(t.append_action(action).is_err());
    }

    #[test]
    fn actions_key_sequentially_in_append_order() {
        let mut t = Traversal::new(
            "goal",
            vec![],
            BrowserConfig::desktop_default(),
            vec![],
            None,
        );
        t.append_brain_state(sample_brain_state(1)).unwrap();
        let k1 = t
            .append_action(ExtendedAction {
                brain_state_id: BrainStateId::from_ordinal(1),
                action: ActionKind::Wait { seconds: 0.1 },
                dom_element_data: None,
                screenshot_filename: None,
            })
            .unwrap();
        let k2 = t
            .append_action(ExtendedAction {
                brain_state_id: BrainStateId::from_ordinal(1),
                action: ActionKind::Wait { seconds: 0.1 },
                dom_element_data: None,
                screenshot_filename: None,
            })
            .unwrap();
        assert_eq!(k1.0, "action_1");
        assert_eq!(k2.0, "action_2");
        assert!(t.verify_ordering_invariant().is_ok());
    }
}
