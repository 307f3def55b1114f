//! Shared identifiers, error taxonomy, the closed action-kind model, and
//! the traversal data model used throughout the orchestrator core.

mod action;
mod atomic;
mod browser;
mod browser_iface;
mod error;
mod ids;
mod llm_iface;
mod pipeline;
mod secret;
mod task;
mod traversal;

pub use action::ActionKind;
pub use atomic::write_atomic;
pub use browser::BrowserConfig;
pub use browser_iface::{
    BoundingBox, BrowserController, BrowserStateSummary, DomNode, LoadState, TabInfo,
};
pub use error::{ErrorContext, OrchestratorError, OrchestratorResult};
pub use ids::{ActionKey, BrainStateId, NodeId, RunId, TaskId};
pub use llm_iface::{DecisionRequest, LlmClient, LlmDecision};
pub use pipeline::{PipelineNode, TaskSource, TaskSpec};
pub use secret::SecretMap;
pub use task::{BulkResult, TaskError, TaskResult};
pub use traversal::{BrainState, DomElementData, ExtendedAction, IoSchema, Traversal, TraversalStatus};
