use std::collections::HashSet;
use std::sync::{Arc, Weak};

use dashmap::{DashMap, DashSet};
use toastd_core::{EventType, Identity, Signal};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{ConnectionEvent, Environment};
use crate::store::{RootAction, Store};

/// Tracks which applications are ready to receive `notification-action`
/// events and launches applications on demand.
///
/// An application is action-ready while at least one of its windows listens
/// for that event type. Only the transition to ready is signalled.
pub struct ClientRegistry {
    store: Weak<Store>,
    environment: Arc<dyn Environment>,
    /// Listening windows per application uuid
    action_ready: DashMap<String, HashSet<Identity>>,
    seen_apps: DashSet<String>,
    launching: DashSet<String>,
    on_app_action_ready: Signal<Identity>,
}

impl ClientRegistry {
    pub fn new(store: &Arc<Store>, environment: Arc<dyn Environment>) -> Self {
        Self {
            store: Arc::downgrade(store),
            environment,
            action_ready: DashMap::new(),
            seen_apps: DashSet::new(),
            launching: DashSet::new(),
            on_app_action_ready: Signal::new(),
        }
    }

    /// Fired with the window that made its application action-ready.
    pub fn on_app_action_ready(&self) -> &Signal<Identity> {
        &self.on_app_action_ready
    }

    pub fn is_app_action_ready(&self, app_id: &str) -> bool {
        self.action_ready
            .get(app_id)
            .is_some_and(|windows| !windows.is_empty())
    }

    pub async fn on_add_event_listener(&self, event_type: EventType, identity: &Identity) {
        if event_type != EventType::NotificationAction {
            return;
        }
        let became_ready = {
            let mut windows = self
                .action_ready
                .entry(identity.app_id().to_string())
                .or_default();
            let was_ready = !windows.is_empty();
            windows.insert(identity.clone()) && !was_ready
        };
        if became_ready {
            info!(app_id = %identity.app_id(), client = %identity, "Application is action-ready");
            self.on_app_action_ready.emit(identity).await;
        }
    }

    pub fn on_remove_event_listener(&self, event_type: EventType, identity: &Identity) {
        if event_type == EventType::NotificationAction {
            self.forget_window(identity);
        }
    }

    /// Records launch metadata the first time a window of an application
    /// connects.
    pub async fn on_connection(&self, identity: &Identity) {
        if !self.seen_apps.insert(identity.app_id().to_string()) {
            return;
        }
        let app = match self.environment.get_application(identity).await {
            Ok(app) => app,
            Err(e) => {
                warn!(client = %identity, error = %e, "Failed to look up application");
                self.seen_apps.remove(identity.app_id());
                return;
            }
        };
        let Some(store) = self.store.upgrade() else {
            return;
        };
        debug!(app_id = %app.id(), "Registering application");
        if let Err(e) = store
            .dispatch(RootAction::RegisterApplication(app))
            .await
        {
            warn!(app_id = %identity.app_id(), error = %e, "Failed to register application");
        }
    }

    pub fn on_disconnection(&self, identity: &Identity) {
        self.forget_window(identity);
    }

    /// Starts `app_id` unless it is running or a launch is in flight.
    ///
    /// Failures are logged; the next event that needs the application tries
    /// again, as does one arriving after the application exited.
    pub async fn try_launch_application(&self, app_id: &str) {
        if self.environment.is_application_running(app_id).await {
            debug!(app_id = %app_id, "Application already running");
            return;
        }
        if !self.launching.insert(app_id.to_string()) {
            debug!(app_id = %app_id, "Application launch already in flight");
            return;
        }
        let app = self
            .store
            .upgrade()
            .and_then(|store| store.state().application(app_id).cloned());
        let Some(app) = app else {
            warn!(app_id = %app_id, "No launch metadata for application");
            self.launching.remove(app_id);
            return;
        };
        match self.environment.start_application(&app).await {
            Ok(()) => info!(app_id = %app_id, "Launched application for deferred events"),
            Err(e) => warn!(app_id = %app_id, error = %e, "Failed to launch application"),
        }
        // from here on the environment's running check decides
        self.launching.remove(app_id);
    }

    /// Consumes connection events until the transport closes.
    pub async fn run(self: Arc<Self>, mut receiver: broadcast::Receiver<ConnectionEvent>) {
        debug!("Starting client registry");

        loop {
            match receiver.recv().await {
                Ok(ConnectionEvent::Connected(identity)) => self.on_connection(&identity).await,
                Ok(ConnectionEvent::Disconnected(identity)) => self.on_disconnection(&identity),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(missed = n, "Client registry lagged, missed connection events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Connection channel closed, stopping client registry");
                    break;
                }
            }
        }
    }

    fn forget_window(&self, identity: &Identity) {
        let app_id = identity.app_id();
        let removed = self
            .action_ready
            .get_mut(app_id)
            .is_some_and(|mut windows| windows.remove(identity));
        if removed
            && self
                .action_ready
                .remove_if(app_id, |_, windows| windows.is_empty())
                .is_some()
        {
            debug!(app_id = %app_id, "Application no longer action-ready");
        }
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("action_ready_apps", &self.action_ready.len())
            .field("launching", &self.launching.len())
            .finish()
    }
}
