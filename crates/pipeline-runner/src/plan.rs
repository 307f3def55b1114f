//! Build phase (§4.6): resolve every node to a concrete [`TaskSpec`],
//! validate I/O schema compatibility, and produce a topological
//! execution order. Everything here runs before any node executes —
//! violations abort the whole pipeline up front (Invariant 5, Testable
//! Properties 4 and 5's "before any node runs" half).

use std::collections::{BTreeMap, BTreeSet};

use soulbrowser_core_types::{NodeId, OrchestratorError, PipelineNode, TaskSource, TaskSpec};

use crate::resolver::TaskResolver;
use crate::toposort::topo_sort;

/// One pipeline node after `TaskRef` resolution.
#[derive(Clone, Debug)]
pub struct ResolvedNode {
    pub id: NodeId,
    pub spec: TaskSpec,
    pub parents: BTreeSet<NodeId>,
}

/// The Pipeline DAG Runner's build-phase output: a validated, ordered
/// set of nodes ready to execute.
#[derive(Clone, Debug)]
pub struct ExecutionPlan {
    pub order: Vec<NodeId>,
    pub nodes: BTreeMap<NodeId, ResolvedNode>,
}

impl ExecutionPlan {
    pub fn node(&self, id: &NodeId) -> &ResolvedNode {
        self.nodes.get(id).expect("execution order only lists planned node ids")
    }
}

/// Run the full build phase (§4.6 steps 1-3) over `nodes`.
pub async fn build_plan(
    nodes: Vec<PipelineNode>,
    resolver: &dyn TaskResolver,
) -> Result<ExecutionPlan, OrchestratorError> {
    let mut resolved: BTreeMap<NodeId, ResolvedNode> = BTreeMap::new();

    for node in nodes {
        if resolved.contains_key(&node.id) {
            return Err(OrchestratorError::validation(format!(
                "duplicate pipeline node id: {}",
                node.id
            )));
        }
        let spec = match node.task {
            TaskSource::Inline(spec) => spec,
            TaskSource::Ref(task_id) => resolver.resolve(&task_id).await?,
        };
        resolved.insert(
            node.id.clone(),
            ResolvedNode {
                id: node.id,
                spec,
                parents: node.parents,
            },
        );
    }

    validate_io(&resolved)?;

    let parent_sets: BTreeMap<NodeId, BTreeSet<NodeId>> = resolved
        .iter()
        .map(|(id, n)| (id.clone(), n.parents.clone()))
        .collect();
    let order = topo_sort(&parent_sets)?;

    Ok(ExecutionPlan {
        order,
        nodes: resolved,
    })
}

/// §4.6 build phase step 2: "the union of its parents' `output_schema`
/// keys must be a subset of the child's `input_schema` keys. Violations
/// abort before any execution."
fn validate_io(nodes: &BTreeMap<NodeId, ResolvedNode>) -> Result<(), OrchestratorError> {
    for (child_id, child) in nodes {
        let mut required: BTreeSet<String> = BTreeSet::new();
        let mut missing_by_parent: BTreeMap<NodeId, Vec<String>> = BTreeMap::new();

        for parent_id in &child.parents {
            let Some(parent) = nodes.get(parent_id) else {
                return Err(OrchestratorError::validation(format!(
                    "node {child_id} depends on unresolvable parent {parent_id}"
                )));
            };
            let parent_keys: BTreeSet<String> = parent.spec.output_schema.keys().cloned().collect();
            let missing: Vec<String> = parent_keys
                .difference(&child.spec.input_schema.keys().cloned().collect())
                .cloned()
                .collect();
            if !missing.is_empty() {
                missing_by_parent.insert(parent_id.clone(), missing.clone());
            }
            required.extend(parent_keys);
        }

        let child_inputs: BTreeSet<String> = child.spec.input_schema.keys().cloned().collect();
        if !required.is_subset(&child_inputs) {
            return Err(OrchestratorError::validation(format!(
                "I/O schema mismatch for node {child_id}: parents provide keys not in its \
                 input_schema ({missing_by_parent:?})"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::NoTaskRefs;
    use std::collections::BTreeMap as Map;

    fn spec_with(output: &[(&str, &str)], input: &[(&str, &str)]) -> TaskSpec {
        let mut spec = TaskSpec::inline("do something");
        spec.output_schema = output.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<Map<_, _>>();
        spec.input_schema = input.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<Map<_, _>>();
        spec
    }

    #[tokio::test]
    async fn compatible_schemas_produce_a_valid_plan() {
        let a = PipelineNode::new("a", TaskSource::Inline(spec_with(&[("SELECTED", "item")], &[])));
        let b = PipelineNode::new(
            "b",
            TaskSource::Inline(spec_with(&[], &[("SELECTED", "item")])),
        )
        .with_parents([NodeId::from("a")]);
        let plan = build_plan(vec![a, b], &NoTaskRefs).await.unwrap();
        assert_eq!(plan.order, vec![NodeId::from("a"), NodeId::from("b")]);
    }

    #[tokio::test]
    async fn missing_input_key_for_parent_output_is_rejected() {
        let a = PipelineNode::new("a", TaskSource::Inline(spec_with(&[("X", "d")], &[])));
        let b = PipelineNode::new("b", TaskSource::Inline(spec_with(&[], &[])))
            .with_parents([NodeId::from("a")]);
        let err = build_plan(vec![a, b], &NoTaskRefs).await.unwrap_err();
        assert_eq!(err.kind_name(), "validation_error");
    }

    #[tokio::test]
    async fn duplicate_node_id_is_rejected() {
        let a = PipelineNode::new("a", TaskSource::Inline(TaskSpec::inline("first")));
        let a2 = PipelineNode::new("a", TaskSource::Inline(TaskSpec::inline("second")));
        let err = build_plan(vec![a, a2], &NoTaskRefs).await.unwrap_err();
        assert_eq!(err.kind_name(), "validation_error");
    }

    #[tokio::test]
    async fn cyclic_plan_is_rejected_before_any_node_is_resolved_for_execution() {
        let a = PipelineNode::new("a", TaskSource::Inline(TaskSpec::inline("a")))
            .with_parents([NodeId::from("b")]);
        let b = PipelineNode::new("b", TaskSource::Inline(TaskSpec::inline("b")))
            .with_parents([NodeId::from("a")]);
        let err = build_plan(vec![a, b], &NoTaskRefs).await.unwrap_err();
        assert_eq!(err.kind_name(), "cyclic_dependency");
    }
}
