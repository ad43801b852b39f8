use thiserror::Error;

/// Core error types for fanout operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid namespaced name: {0}")]
    InvalidName(String),

    #[error("Invalid workload: {message}")]
    InvalidWorkload { message: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new InvalidName error.
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName(name.into())
    }

    /// Create a new InvalidWorkload error.
    pub fn invalid_workload(message: impl Into<String>) -> Self {
        Self::InvalidWorkload {
            message: message.into(),
        }
    }
}
