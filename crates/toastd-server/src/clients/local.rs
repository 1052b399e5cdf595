//! In-process transport and environment.
//!
//! Used by the `toastd` host, where every window lives behind the same
//! stdin/stdout pipe, and by tests that need to observe deliveries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde::Serialize;
use toastd_core::{Identity, NotificationEvent, StoredApplication};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use super::{ConnectionEvent, Environment, Transport};
use crate::error::{EnvironmentError, TransportError};

const CONNECTION_CHANNEL_CAPACITY: usize = 256;

/// An event handed to a client window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivery {
    pub target: Identity,
    pub event: NotificationEvent,
}

/// Transport whose windows are plain identities; deliveries are forwarded to
/// a channel.
pub struct LocalTransport {
    connections: RwLock<Vec<Identity>>,
    connection_events: broadcast::Sender<ConnectionEvent>,
    deliveries: mpsc::UnboundedSender<Delivery>,
}

impl LocalTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Delivery>) {
        let (deliveries, receiver) = mpsc::unbounded_channel();
        let (connection_events, _) = broadcast::channel(CONNECTION_CHANNEL_CAPACITY);
        let transport = Arc::new(Self {
            connections: RwLock::new(Vec::new()),
            connection_events,
            deliveries,
        });
        (transport, receiver)
    }

    /// Registers a window. Returns `false` if it was already connected.
    pub fn connect(&self, identity: Identity) -> bool {
        {
            let mut connections = self
                .connections
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if connections.contains(&identity) {
                return false;
            }
            connections.push(identity.clone());
        }
        debug!(client = %identity, "Client connected");
        // no subscribers is fine, nothing tracks connections yet
        let _ = self
            .connection_events
            .send(ConnectionEvent::Connected(identity));
        true
    }

    /// Removes a window. Returns `false` if it was not connected.
    pub fn disconnect(&self, identity: &Identity) -> bool {
        {
            let mut connections = self
                .connections
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let before = connections.len();
            connections.retain(|c| c != identity);
            if connections.len() == before {
                return false;
            }
        }
        debug!(client = %identity, "Client disconnected");
        let _ = self
            .connection_events
            .send(ConnectionEvent::Disconnected(identity.clone()));
        true
    }

    pub fn is_connected(&self, identity: &Identity) -> bool {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(identity)
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn dispatch_event(
        &self,
        target: &Identity,
        event: &NotificationEvent,
    ) -> Result<(), TransportError> {
        if !self.is_connected(target) {
            return Err(TransportError::NotConnected(target.clone()));
        }
        self.deliveries
            .send(Delivery {
                target: target.clone(),
                event: event.clone(),
            })
            .map_err(|_| TransportError::Delivery("delivery channel closed".into()))
    }

    fn client_connections(&self) -> Vec<Identity> {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.connection_events.subscribe()
    }
}

impl std::fmt::Debug for LocalTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTransport")
            .field("connections", &self.client_connections().len())
            .finish()
    }
}

/// Environment that tracks applications in memory.
///
/// Applications it has not been told about are described as programmatic
/// applications named after their uuid.
#[derive(Debug, Default)]
pub struct LocalEnvironment {
    applications: DashMap<String, StoredApplication>,
    running: DashSet<String>,
    launches: Mutex<Vec<String>>,
    assume_running: bool,
    fail_launches: AtomicBool,
}

impl LocalEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment reporting every application as running, so nothing is
    /// ever launched.
    pub fn always_running() -> Self {
        Self {
            assume_running: true,
            ..Self::default()
        }
    }

    pub fn register(&self, app: StoredApplication) {
        self.applications.insert(app.id().to_string(), app);
    }

    pub fn set_running(&self, app_id: &str, running: bool) {
        if running {
            self.running.insert(app_id.to_string());
        } else {
            self.running.remove(app_id);
        }
    }

    /// Make every later launch fail.
    pub fn fail_launches(&self, fail: bool) {
        self.fail_launches.store(fail, Ordering::SeqCst);
    }

    /// Ids of launched applications, in launch order.
    pub fn launches(&self) -> Vec<String> {
        self.launches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Environment for LocalEnvironment {
    async fn is_application_running(&self, app_id: &str) -> bool {
        self.assume_running || self.running.contains(app_id)
    }

    async fn get_application(
        &self,
        source: &Identity,
    ) -> Result<StoredApplication, EnvironmentError> {
        if let Some(app) = self.applications.get(source.app_id()) {
            return Ok(app.value().clone());
        }
        Ok(StoredApplication::Programmatic {
            id: source.uuid.clone(),
            title: source.uuid.clone(),
            initial_options: serde_json::json!({ "uuid": source.uuid, "name": source.name }),
            parent_uuid: None,
        })
    }

    async fn start_application(&self, app: &StoredApplication) -> Result<(), EnvironmentError> {
        if self.fail_launches.load(Ordering::SeqCst) {
            return Err(EnvironmentError::Launch {
                app_id: app.id().to_string(),
                message: "launch refused".into(),
            });
        }
        self.launches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(app.id().to_string());
        self.running.insert(app.id().to_string());
        info!(app_id = %app.id(), "Started application");
        Ok(())
    }
}
