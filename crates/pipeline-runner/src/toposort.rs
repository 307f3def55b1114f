//! Kahn's algorithm (§4.6 build phase step 3, §9 design note "Cycle
//! detection & resolution at pipeline build"). Kept standalone and pure
//! so Testable Property 4 ("for any DAG input, the execution order
//! produced is a valid topological order; cyclic inputs are rejected
//! before any node runs") can be exercised directly.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use soulbrowser_core_types::{NodeId, OrchestratorError};

/// Topologically sort `nodes` (id -> its parent ids) via Kahn's
/// algorithm. Returns the ids in an order where every node follows all
/// of its parents. `cyclic_dependency` if the graph contains a cycle —
/// surfaced before any node executes (Invariant 5).
pub fn topo_sort(
    nodes: &BTreeMap<NodeId, BTreeSet<NodeId>>,
) -> Result<Vec<NodeId>, OrchestratorError> {
    // child -> parents already given; build parent -> children (outgoing)
    // and each node's remaining in-degree (count of parents).
    let mut outgoing: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    let mut indegree: BTreeMap<NodeId, usize> = BTreeMap::new();

    for id in nodes.keys() {
        indegree.entry(id.clone()).or_insert(0);
        outgoing.entry(id.clone()).or_default();
    }
    for (child, parents) in nodes {
        for parent in parents {
            if !nodes.contains_key(parent) {
                return Err(OrchestratorError::validation(format!(
                    "node {child} depends on unresolvable parent {parent}"
                )));
            }
            outgoing.entry(parent.clone()).or_default().push(child.clone());
            *indegree.entry(child.clone()).or_insert(0) += 1;
        }
    }

    let mut queue: VecDeque<NodeId> = indegree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(id, _)| id.clone())
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(id) = queue.pop_front() {
        order.push(id.clone());
        if let Some(children) = outgoing.get(&id) {
            for child in children {
                let deg = indegree.get_mut(child).expect("child tracked in indegree");
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(child.clone());
                }
            }
        }
    }

    if order.len() != nodes.len() {
        let stuck: Vec<String> = nodes
            .keys()
            .filter(|id| !order.contains(id))
            .map(|id| id.to_string())
            .collect();
        return Err(OrchestratorError::cyclic_dependency(format!(
            "cyclic dependency among nodes: {}",
            stuck.join(", ")
        )));
    }

    Ok(order)
}
