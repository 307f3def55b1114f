//! Collision-free and caller-supplied identifiers used throughout the
//! orchestrator core.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Collision-free identifier for one navigation or replay run.
///
/// Used to name traversal files and the per-run browser data directory
/// (`<base>/run_<run_id>/`, see Invariant 8).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a persisted task configuration or an inline task spec,
/// scoped to a single pipeline.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a node within a pipeline DAG. Unlike [`RunId`]/[`TaskId`]
/// this is caller-supplied (nodes are addressed by name in pipeline
/// definitions), so it wraps an arbitrary string rather than minting a
/// UUID.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Stable identifier of a brain state within a traversal. Brain-state ids
/// are chronological: comparing two ids by their ordinal is equivalent to
/// comparing "which was observed first".
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BrainStateId(pub String);

impl BrainStateId {
    pub fn from_ordinal(ordinal: u32) -> Self {
        Self(format!("brain_state_{ordinal}"))
    }
}

impl fmt::Display for BrainStateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key of an extended action within a traversal's ordered action map
/// (`action_1`, `action_2`, …).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ActionKey(pub String);

impl ActionKey {
    pub fn from_ordinal(ordinal: u32) -> Self {
        Self(format!("action_{ordinal}"))
    }

    /// The 1-based ordinal encoded in this key, if it follows the
    /// standard `action_<N>` shape (it always does for keys minted by
    /// [`Self::from_ordinal`], but replay may load a file produced by an
    /// older or foreign writer).
    pub fn ordinal(&self) -> Option<u32> {
        self.0.strip_prefix("action_").and_then(|n| n.parse().ok())
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
