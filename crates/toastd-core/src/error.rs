use thiserror::Error;

/// Core error types for toastd operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid notification id: {0}")]
    InvalidId(String),

    #[error("Invalid notification: {message}")]
    InvalidNotification { message: String },
}

impl CoreError {
    /// Create a new InvalidId error
    pub fn invalid_id(id: impl Into<String>) -> Self {
        Self::InvalidId(id.into())
    }

    /// Create a new InvalidNotification error
    pub fn invalid_notification(message: impl Into<String>) -> Self {
        Self::InvalidNotification {
            message: message.into(),
        }
    }

    /// Whether the error was caused by the caller's input
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_) | Self::InvalidId(_) | Self::InvalidNotification { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
