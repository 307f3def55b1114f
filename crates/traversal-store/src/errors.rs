use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraversalStoreError {
    #[error("traversal already started")]
    AlreadyStarted,

    #[error("traversal not started")]
    NotStarted,

    #[error("traversal invariant violated: {0}")]
    Invariant(#[from] soulbrowser_core_types::OrchestratorError),

    #[error("failed to serialize traversal: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write traversal file: {0}")]
    Io(#[source] std::io::Error),

    #[error("failed to read traversal file: {0}")]
    Read(#[source] std::io::Error),

    #[error("traversal file is not valid JSON (writer may still be in progress): {0}")]
    Parse(#[source] serde_json::Error),
}
