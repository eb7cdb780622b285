use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Failed to acquire lock: {0}")]
    LockError(String),

    #[error("Sync engine is not running")]
    EngineStopped,
}

impl SyncError {
    /// Whether this error came from talking to the remote service rather than
    /// from local state.
    pub fn is_remote(&self) -> bool {
        matches!(self, SyncError::Transport(_) | SyncError::Server { .. })
    }
}
