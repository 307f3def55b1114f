//! Pipeline DAG node shapes consumed by `pipeline-runner` (C6). Resolving
//! a `TaskRef` to a concrete `TaskSpec` is a host responsibility (the CLI
//! reads TOML, library callers supply a resolver) — see §4.6 build phase
//! step 1 and the `TaskResolver` trait in `pipeline-runner`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::{NodeId, TaskId};

/// Either a reference to a persisted task configuration or a fully
/// inline task specification. Exactly one of these constructs the task
/// that a pipeline node runs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TaskSource {
    Ref(TaskId),
    Inline(TaskSpec),
}

/// The task-level configuration a navigation run is built from: the
/// natural-language goal, schemas, secrets (names only — values are
/// supplied out of band by the host at run time and never stored in the
/// spec itself), and per-task execution knobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskSpec {
    pub test_case: String,
    pub extra_instructions: Vec<String>,
    pub input_schema: BTreeMap<String, String>,
    pub output_schema: BTreeMap<String, String>,
    pub secret_names: Vec<String>,
    pub max_steps: u32,
    pub enable_healing: bool,
    pub allowed_domains: Vec<String>,
    /// True when this spec was loaded from a persisted task configuration
    /// (as opposed to built inline for this pipeline run). §4.6 execute
    /// phase step 3: a missing required input is fatal unless this is
    /// true, in which case it's a warning and the LLM may still fill it.
    pub from_persisted_config: bool,
}

impl TaskSpec {
    pub fn inline(test_case: impl Into<String>) -> Self {
        Self {
            test_case: test_case.into(),
            extra_instructions: Vec::new(),
            input_schema: BTreeMap::new(),
            output_schema: BTreeMap::new(),
            secret_names: Vec::new(),
            max_steps: 50,
            enable_healing: true,
            allowed_domains: Vec::new(),
            from_persisted_config: false,
        }
    }
}

/// A node in the pipeline DAG: a task source plus the set of node ids it
/// depends on (§3 `PipelineNode`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineNode {
    pub id: NodeId,
    pub task: TaskSource,
    pub parents: BTreeSet<NodeId>,
}

impl PipelineNode {
    pub fn new(id: impl Into<NodeId>, task: TaskSource) -> Self {
        Self {
            id: id.into(),
            task,
            parents: BTreeSet::new(),
        }
    }

    pub fn with_parents(mut self, parents: impl IntoIterator<Item = NodeId>) -> Self {
        self.parents = parents.into_iter().collect();
        self
    }
}
