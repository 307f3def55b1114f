//! Per-task browser client acquisition (§4.6 execute phase step 4): "a
//! single shared client supplied by the caller, or via a client-factory
//! callback (one client per task; enables per-task isolation of
//! viewport, user-agent, output directories)".

use std::sync::Arc;

use async_trait::async_trait;
use soulbrowser_core_types::{BrowserController, NodeId, OrchestratorResult, TaskSpec};

/// Builds a fresh, isolated browser controller for one pipeline node.
/// Implementations typically point the controller at a per-node data
/// directory (`./<base>/run_<run_id>/`, §4.6 "Per-task client
/// isolation") derived from `task`'s `allowed_domains`/viewport needs.
#[async_trait]
pub trait BrowserClientFactory: Send + Sync {
    async fn build(
        &self,
        node_id: &NodeId,
        task: &TaskSpec,
    ) -> OrchestratorResult<Arc<dyn BrowserController>>;
}

/// How the [`crate::PipelineRunner`] obtains a browser controller per
/// node: a single client shared by the whole pipeline run (`agent`
/// mode), or a factory invoked once per node for isolation (`auto`
/// mode) — §4.6 "execution mode (`agent` .. `auto` .. per-node client
/// instantiation)".
pub enum ClientStrategy {
    Shared(Arc<dyn BrowserController>),
    PerNode(Arc<dyn BrowserClientFactory>),
}

impl ClientStrategy {
    pub(crate) async fn obtain(
        &self,
        node_id: &NodeId,
        task: &TaskSpec,
    ) -> OrchestratorResult<Arc<dyn BrowserController>> {
        match self {
            Self::Shared(client) => Ok(client.clone()),
            Self::PerNode(factory) => factory.build(node_id, task).await,
        }
    }
}
