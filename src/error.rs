use thiserror::Error;

pub type Result<T> = std::result::Result<T, KanbanError>;

#[derive(Debug, Error)]
pub enum KanbanError {
    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Subtask not found: {0}")]
    SubtaskNotFound(String),

    #[error("Owner not found: {0}")]
    OwnerNotFound(String),

    #[error("Board quota reached: {usage} of {limit} boards used")]
    UsageExceeded { usage: u32, limit: u32 },

    #[error("Invalid reorder for {scope}: {reason}")]
    InvalidReorder { scope: String, reason: String },

    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Storage not initialized")]
    StorageNotInitialized,

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Other(String),
}
