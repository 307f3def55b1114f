//! The LLM capability (§6, consumed interface): a chat-completion
//! surface with structured-output parsing into `{current_state,
//! action[]}`. Provider adapters (OpenAI/Anthropic/etc. wire clients)
//! live outside this crate — see SPEC_FULL §1 non-goals.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::action::ActionKind;
use crate::error::OrchestratorResult;
use crate::traversal::BrainState;

/// One decision round-trip's expected shape: the LLM's situational
/// assessment plus the batch of actions it wants performed next.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LlmDecision {
    pub current_state: BrainState,
    pub action: Vec<ActionKind>,
}

/// What the Navigation Loop sends the LLM each step (§4.4 step 2).
#[derive(Clone, Debug)]
pub struct DecisionRequest {
    pub goal: String,
    pub memory: String,
    pub dom_summary_text: String,
    pub extra_instructions: Vec<String>,
    pub system_prompt: String,
}

/// Polymorphic LLM client capability (§9 design note). Stateless from
/// the engine's perspective — safe to reuse across runs.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Free-form completion, used by sub-components that don't need a
    /// structured shape (e.g. a healing sub-task's intent summary).
    async fn complete(&self, system: &str, user: &str) -> OrchestratorResult<String>;

    /// Structured completion constrained to `{current_state, action[]}`.
    /// Implementations are expected to use provider-side structured
    /// output / tool-calling; this trait only specifies the contract.
    async fn complete_structured(
        &self,
        request: &DecisionRequest,
    ) -> OrchestratorResult<LlmDecision>;
}
