//! Notification domain model.
//!
//! - `Notification` is the payload an application creates, identified by an
//!   id that is only unique within that application.
//! - `StoredNotification` pairs it with its source window and the composite
//!   `"{appId}:{notificationId}"` key used by the store and persistence.
//! - `StoredApplication` keeps the launch metadata needed to relaunch an
//!   application for deferred event delivery.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Opaque data returned to the application when a notification is
/// interacted with (selected, closed, expired or a button clicked).
pub type ActionResult = serde_json::Value;

/// Build the globally unique key for a notification owned by `app_id`.
pub fn composite_id(app_id: &str, notification_id: &str) -> String {
    format!("{app_id}:{notification_id}")
}

/// Identity of a connected client window.
///
/// `uuid` identifies the application, `name` the window inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub uuid: String,
    pub name: String,
}

impl Identity {
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
        }
    }

    /// The application this window belongs to
    pub fn app_id(&self) -> &str {
        &self.uuid
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.uuid, self.name)
    }
}

/// A button shown on a notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonOptions {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,

    /// Result passed back to the application when the button is clicked.
    /// `None` suppresses the `notification-action` event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_click: Option<ActionResult>,
}

/// A notification as seen by the application that created it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub body: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub icon: String,

    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,

    /// Wall-clock time at which the notification is removed automatically
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires: Option<OffsetDateTime>,

    #[serde(default)]
    pub buttons: Vec<ButtonOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_select: Option<ActionResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_close: Option<ActionResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_expire: Option<ActionResult>,

    #[serde(default)]
    pub custom_data: serde_json::Map<String, serde_json::Value>,
}

impl Notification {
    pub fn expires(&self) -> bool {
        self.expires.is_some()
    }
}

/// The unit kept in the store and in the persisted notification collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredNotification {
    /// Composite `"{appId}:{notificationId}"` key
    pub id: String,
    pub source: Identity,
    pub notification: Notification,
}

impl StoredNotification {
    pub fn new(source: Identity, notification: Notification) -> Self {
        Self {
            id: composite_id(source.app_id(), &notification.id),
            source,
            notification,
        }
    }

    pub fn app_id(&self) -> &str {
        self.source.app_id()
    }

    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.notification.expires
    }
}

/// Launch metadata for an application that has connected at least once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoredApplication {
    #[serde(rename_all = "camelCase")]
    Manifest {
        id: String,
        title: String,
        manifest_url: String,
    },
    #[serde(rename_all = "camelCase")]
    Programmatic {
        id: String,
        title: String,
        initial_options: serde_json::Value,
        #[serde(default)]
        parent_uuid: Option<String>,
    },
}

impl StoredApplication {
    pub fn id(&self) -> &str {
        match self {
            StoredApplication::Manifest { id, .. } | StoredApplication::Programmatic { id, .. } => {
                id
            }
        }
    }

    pub fn title(&self) -> &str {
        match self {
            StoredApplication::Manifest { title, .. }
            | StoredApplication::Programmatic { title, .. } => title,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::note;
    use super::*;

    #[test]
    fn test_composite_id() {
        let stored = StoredNotification::new(Identity::new("app-1", "main"), note("n1"));
        assert_eq!(stored.id, "app-1:n1");
        assert_eq!(stored.app_id(), "app-1");
    }

    #[test]
    fn test_notification_camel_case() {
        let mut n = note("n1");
        n.on_select = Some(serde_json::json!({"task": "open"}));
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["onSelect"]["task"], "open");
        assert!(json.get("onClose").is_none());
        assert!(json["expires"].is_null());
    }

    #[test]
    fn test_stored_application_tagged() {
        let app = StoredApplication::Manifest {
            id: "app-1".into(),
            title: "App".into(),
            manifest_url: "https://example.com/app.json".into(),
        };
        let json = serde_json::to_value(&app).unwrap();
        assert_eq!(json["type"], "manifest");
        assert_eq!(json["manifestUrl"], "https://example.com/app.json");

        let back: StoredApplication = serde_json::from_value(json).unwrap();
        assert_eq!(back.id(), "app-1");
        assert_eq!(back.title(), "App");
    }

    #[test]
    fn test_identity_display() {
        assert_eq!(Identity::new("app", "win").to_string(), "app/win");
    }
}
