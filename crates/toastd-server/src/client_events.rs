//! Translates store actions into client events.

use std::sync::Arc;

use async_trait::async_trait;
use toastd_core::{ActionTrigger, HookError, Listener, NotificationEvent, StoredNotification};
use tracing::debug;

use crate::event_pump::EventPump;
use crate::store::{ActionEvent, RootAction};

/// Emits `notification-created`, `notification-closed` and
/// `notification-action` events to the owning application.
///
/// Created and closed events are unconditional. An action event is only
/// emitted when the notification (or clicked button) carries a result for
/// that trigger.
pub struct ClientEventController {
    pump: Arc<EventPump>,
}

impl ClientEventController {
    pub fn new(pump: Arc<EventPump>) -> Self {
        Self { pump }
    }

    async fn send(&self, note: &StoredNotification, event: NotificationEvent) {
        debug!(
            notification_id = %note.id,
            event = %event.event_type(),
            "Sending client event"
        );
        self.pump.push(note.app_id(), event).await;
    }
}

#[async_trait]
impl Listener<ActionEvent> for ClientEventController {
    fn name(&self) -> &str {
        "client-events"
    }

    async fn handle(&self, event: &ActionEvent) -> Result<(), HookError> {
        match &event.action {
            RootAction::CreateNotification(note) => {
                let created = NotificationEvent::Created {
                    notification: note.notification.clone(),
                };
                self.send(note, created).await;
            }
            RootAction::RemoveNotifications(notes) => {
                for note in notes {
                    let closed = NotificationEvent::Closed {
                        notification: note.notification.clone(),
                    };
                    self.send(note, closed).await;
                    if let Some(result) = &note.notification.on_close {
                        let action = NotificationEvent::action(
                            note.notification.clone(),
                            ActionTrigger::Close,
                            result.clone(),
                        );
                        self.send(note, action).await;
                    }
                }
            }
            RootAction::ClickButton {
                notification,
                button_index,
            } => {
                let Some(button) = notification.notification.buttons.get(*button_index) else {
                    debug!(
                        notification_id = %notification.id,
                        button_index,
                        "Clicked button does not exist"
                    );
                    return Ok(());
                };
                if let Some(result) = &button.on_click {
                    let action = NotificationEvent::Action {
                        notification: notification.notification.clone(),
                        trigger: ActionTrigger::Control,
                        result: result.clone(),
                        control: Some(button.clone()),
                    };
                    self.send(notification, action).await;
                }
            }
            RootAction::ClickNotification(note) => {
                if let Some(result) = &note.notification.on_select {
                    let action = NotificationEvent::action(
                        note.notification.clone(),
                        ActionTrigger::Select,
                        result.clone(),
                    );
                    self.send(note, action).await;
                }
            }
            RootAction::ExpireNotification(note) => {
                if let Some(result) = &note.notification.on_expire {
                    let action = NotificationEvent::action(
                        note.notification.clone(),
                        ActionTrigger::Expire,
                        result.clone(),
                    );
                    self.send(note, action).await;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn matches(&self, event: &ActionEvent) -> bool {
        matches!(
            event.action,
            RootAction::CreateNotification(_)
                | RootAction::RemoveNotifications(_)
                | RootAction::ClickButton { .. }
                | RootAction::ClickNotification(_)
                | RootAction::ExpireNotification(_)
        )
    }
}

impl std::fmt::Debug for ClientEventController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientEventController").finish_non_exhaustive()
    }
}
