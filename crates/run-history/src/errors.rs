use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunHistoryError {
    #[error("run history file not found")]
    NotFound,

    /// §4.7: "Corrupted history files are surfaced to the caller rather
    /// than silently reset." Never auto-recovered by overwriting.
    #[error("run history file is corrupted: {0}")]
    Corrupted(#[source] serde_json::Error),

    #[error("failed to serialize run history: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write run history file: {0}")]
    Io(#[source] std::io::Error),

    #[error("failed to read run history file: {0}")]
    Read(#[source] std::io::Error),
}
