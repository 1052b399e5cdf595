//! Client connections, application environment and action readiness.

mod local;
mod registry;

pub use local::{Delivery, LocalEnvironment, LocalTransport};
pub use registry::ClientRegistry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use toastd_core::{Identity, NotificationEvent, StoredApplication};
use tokio::sync::broadcast;

use crate::error::{EnvironmentError, TransportError};

/// Window connection lifecycle reported by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "identity", rename_all = "lowercase")]
pub enum ConnectionEvent {
    Connected(Identity),
    Disconnected(Identity),
}

/// Delivers events to connected client windows.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `event` to a single window.
    async fn dispatch_event(
        &self,
        target: &Identity,
        event: &NotificationEvent,
    ) -> Result<(), TransportError>;

    /// Every currently connected window.
    fn client_connections(&self) -> Vec<Identity>;

    /// Stream of connection changes from now on.
    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent>;
}

/// Host environment able to inspect and launch applications.
#[async_trait]
pub trait Environment: Send + Sync {
    async fn is_application_running(&self, app_id: &str) -> bool;

    /// Launch metadata for the application owning `source`.
    async fn get_application(
        &self,
        source: &Identity,
    ) -> Result<StoredApplication, EnvironmentError>;

    async fn start_application(&self, app: &StoredApplication) -> Result<(), EnvironmentError>;
}
