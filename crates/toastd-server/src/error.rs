use thiserror::Error;
use toastd_core::{CoreError, HookError, Identity};
use toastd_storage::DatabaseError;

/// Errors surfaced by `Store::dispatch` and `Store::init`.
///
/// A listener failure means the in-memory reduce already committed; only the
/// side effect reported here did not complete.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to load persisted state: {0}")]
    Init(#[source] DatabaseError),

    #[error("Listener '{listener}' failed: {source}")]
    Listener {
        listener: String,
        #[source]
        source: HookError,
    },
}

impl StoreError {
    /// The persistence error behind this failure, if any.
    pub fn database_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            StoreError::Init(e) => Some(e),
            StoreError::Listener {
                source: HookError::Database(e),
                ..
            } => Some(&**e),
            StoreError::Listener { .. } => None,
        }
    }
}

/// Lets a listener that dispatches follow-up actions report their failure
/// without hiding the original cause.
impl From<StoreError> for HookError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Init(e) => HookError::database(e),
            StoreError::Listener { source, .. } => source,
        }
    }
}

/// Errors raised while delivering an event to a client window.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Client {0} is not connected")]
    NotConnected(Identity),

    #[error("Failed to deliver event: {0}")]
    Delivery(String),
}

/// Errors raised by the host environment.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("Failed to launch application {app_id}: {message}")]
    Launch { app_id: String, message: String },
}

/// Errors returned to client applications.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(e) if e.is_validation())
    }
}
