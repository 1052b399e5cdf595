//! Event payloads delivered to client applications.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::model::{ActionResult, ButtonOptions, Notification};

/// Event types a client can listen for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "notification-created")]
    NotificationCreated,
    #[serde(rename = "notification-closed")]
    NotificationClosed,
    #[serde(rename = "notification-action")]
    NotificationAction,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::NotificationCreated => "notification-created",
            EventType::NotificationClosed => "notification-closed",
            EventType::NotificationAction => "notification-action",
        }
    }

    /// Action events are deferred until the target application is listening;
    /// everything else is dropped when nobody is connected.
    pub fn is_deferrable(&self) -> bool {
        matches!(self, EventType::NotificationAction)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notification-created" => Ok(EventType::NotificationCreated),
            "notification-closed" => Ok(EventType::NotificationClosed),
            "notification-action" => Ok(EventType::NotificationAction),
            other => Err(CoreError::invalid_notification(format!(
                "unknown event type '{other}'"
            ))),
        }
    }
}

/// What caused a `notification-action` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionTrigger {
    /// A button on the notification was clicked
    Control,
    /// The notification body was clicked
    Select,
    /// The notification was closed
    Close,
    /// The notification expired
    Expire,
}

/// Event payload as delivered to a client window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotificationEvent {
    #[serde(rename = "notification-created")]
    Created { notification: Notification },

    #[serde(rename = "notification-closed")]
    Closed { notification: Notification },

    #[serde(rename = "notification-action")]
    Action {
        notification: Notification,
        trigger: ActionTrigger,
        result: ActionResult,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        control: Option<ButtonOptions>,
    },
}

impl NotificationEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            NotificationEvent::Created { .. } => EventType::NotificationCreated,
            NotificationEvent::Closed { .. } => EventType::NotificationClosed,
            NotificationEvent::Action { .. } => EventType::NotificationAction,
        }
    }

    pub fn notification(&self) -> &Notification {
        match self {
            NotificationEvent::Created { notification }
            | NotificationEvent::Closed { notification }
            | NotificationEvent::Action { notification, .. } => notification,
        }
    }

    pub fn action(
        notification: Notification,
        trigger: ActionTrigger,
        result: ActionResult,
    ) -> Self {
        NotificationEvent::Action {
            notification,
            trigger,
            result,
            control: None,
        }
    }
}
