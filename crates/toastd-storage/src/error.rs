//! Persistence error types.

/// Errors raised by a persistence backend.
///
/// Backend failures are wrapped with the collection and operation that
/// failed so they stay distinguishable once they surface from a dispatch.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// A CRUD operation failed inside the backend.
    #[error("{operation} on collection '{collection}' failed: {source}")]
    Operation {
        /// Collection the operation targeted.
        collection: String,
        /// The CRUD operation (`get`, `upsert`, ...).
        operation: &'static str,
        /// Underlying backend error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The backend could not be reached.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// A stored record could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DatabaseError {
    /// Wrap a backend error raised by `operation` on `collection`.
    #[must_use]
    pub fn operation(
        collection: impl Into<String>,
        operation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Operation {
            collection: collection.into(),
            operation,
            source: source.into(),
        }
    }

    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_operation_error_keeps_cause() {
        let err = DatabaseError::operation("notifications", "upsert", "disk full");
        assert_eq!(
            err.to_string(),
            "upsert on collection 'notifications' failed: disk full"
        );
        assert_eq!(err.source().map(|s| s.to_string()), Some("disk full".into()));
    }
}
