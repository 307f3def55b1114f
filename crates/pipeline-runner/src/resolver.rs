//! Host-supplied capability for turning a `TaskRef` into a concrete
//! `TaskSpec` (§4.6 build phase step 1: "responsibility left to the
//! host: CLI reads TOML, library callers provide a resolver function").

use async_trait::async_trait;
use soulbrowser_core_types::{OrchestratorResult, TaskId, TaskSpec};

/// Resolves a persisted task configuration by id. The CLI host reads a
/// TOML file from disk (out of scope for this crate, see SPEC_FULL §1);
/// library callers can supply anything that produces a [`TaskSpec`].
#[async_trait]
pub trait TaskResolver: Send + Sync {
    async fn resolve(&self, task_id: &TaskId) -> OrchestratorResult<TaskSpec>;
}

/// A resolver that always fails with `configuration_error` — the
/// default for pipelines that are known to contain only inline
/// [`TaskSpec`] nodes, so a stray `TaskRef` is still a clear error
/// rather than a silent `None`.
pub struct NoTaskRefs;

#[async_trait]
impl TaskResolver for NoTaskRefs {
    async fn resolve(&self, task_id: &TaskId) -> OrchestratorResult<TaskSpec> {
        Err(soulbrowser_core_types::OrchestratorError::configuration(format!(
            "unresolved TaskRef {task_id}: no TaskResolver was configured"
        )))
    }
}
