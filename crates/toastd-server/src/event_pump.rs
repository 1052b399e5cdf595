//! Routes client events to the windows of their target application.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use toastd_core::{HookError, Identity, Listener, NotificationEvent};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clients::{ClientRegistry, Transport};

#[derive(Debug)]
struct DeferredEvent {
    app_id: String,
    event: NotificationEvent,
}

/// Delivers events to connected windows.
///
/// `notification-action` events for an application without an action-ready
/// window are held back, the application is launched, and the events are
/// replayed once in push order when it becomes ready. Other events go only to
/// windows connected right now and are dropped if there are none.
pub struct EventPump {
    transport: Arc<dyn Transport>,
    registry: Arc<ClientRegistry>,
    deferred: Mutex<VecDeque<DeferredEvent>>,
    replay_limit: usize,
}

impl EventPump {
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: Arc<ClientRegistry>,
        replay_limit: usize,
    ) -> Self {
        Self {
            transport,
            registry,
            deferred: Mutex::new(VecDeque::new()),
            replay_limit,
        }
    }

    /// Subscribes `pump` to readiness changes of the registry.
    pub async fn connect(pump: &Arc<Self>) {
        pump.registry
            .on_app_action_ready()
            .connect(Arc::new(ReplayOnReady(Arc::downgrade(pump))))
            .await;
    }

    pub async fn push(&self, app_id: &str, event: NotificationEvent) {
        if !event.event_type().is_deferrable() {
            self.deliver(app_id, &event).await;
            return;
        }

        {
            let mut deferred = self.deferred.lock().await;
            if self.registry.is_app_action_ready(app_id) {
                // anything still queued for the app goes out first
                for older in drain_app(&mut deferred, app_id) {
                    self.deliver(app_id, &older.event).await;
                }
                self.deliver(app_id, &event).await;
                return;
            }

            if deferred.len() >= self.replay_limit
                && let Some(dropped) = deferred.pop_front()
            {
                warn!(
                    app_id = %dropped.app_id,
                    limit = self.replay_limit,
                    "Deferred event queue full, dropping oldest event"
                );
            }
            debug!(app_id = %app_id, "Deferring action event until application is ready");
            deferred.push_back(DeferredEvent {
                app_id: app_id.to_string(),
                event,
            });
        }

        self.registry.try_launch_application(app_id).await;
    }

    /// Delivers every deferred event for `app_id`, oldest first, and forgets
    /// them.
    pub async fn replay(&self, app_id: &str) {
        let mut deferred = self.deferred.lock().await;
        let ready = drain_app(&mut deferred, app_id);
        if ready.is_empty() {
            return;
        }
        info!(app_id = %app_id, count = ready.len(), "Replaying deferred events");
        for entry in ready {
            self.deliver(app_id, &entry.event).await;
        }
    }

    pub async fn deferred_len(&self) -> usize {
        self.deferred.lock().await.len()
    }

    async fn deliver(&self, app_id: &str, event: &NotificationEvent) {
        let windows: Vec<Identity> = self
            .transport
            .client_connections()
            .into_iter()
            .filter(|c| c.app_id() == app_id)
            .collect();
        if windows.is_empty() {
            debug!(app_id = %app_id, event = %event.event_type(), "No connected windows, dropping event");
            return;
        }
        for window in &windows {
            if let Err(e) = self.transport.dispatch_event(window, event).await {
                warn!(client = %window, error = %e, "Failed to deliver event");
            }
        }
    }
}

fn drain_app(deferred: &mut VecDeque<DeferredEvent>, app_id: &str) -> Vec<DeferredEvent> {
    let mut matching = Vec::new();
    let mut rest = VecDeque::with_capacity(deferred.len());
    for entry in deferred.drain(..) {
        if entry.app_id == app_id {
            matching.push(entry);
        } else {
            rest.push_back(entry);
        }
    }
    *deferred = rest;
    matching
}

impl std::fmt::Debug for EventPump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPump")
            .field("replay_limit", &self.replay_limit)
            .finish_non_exhaustive()
    }
}

/// Registry listener replaying deferred events. Holds the pump weakly since
/// the registry outlives it.
struct ReplayOnReady(Weak<EventPump>);

#[async_trait]
impl Listener<Identity> for ReplayOnReady {
    fn name(&self) -> &str {
        "event-pump-replay"
    }

    async fn handle(&self, identity: &Identity) -> Result<(), HookError> {
        if let Some(pump) = self.0.upgrade() {
            pump.replay(identity.app_id()).await;
        }
        Ok(())
    }
}
