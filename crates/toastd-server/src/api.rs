//! Operations available to client applications.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use toastd_core::{
    ActionResult, ButtonOptions, Clock, CoreError, EventType, Identity, Notification,
    StoredNotification, ToggleSource, composite_id,
};
use tracing::info;

use crate::center::CenterController;
use crate::clients::ClientRegistry;
use crate::error::ApiError;
use crate::store::{RootAction, Store};

/// Notification as requested by a client. Only `title` and `body` are
/// required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
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

impl NotificationOptions {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: Some(body.into()),
            ..Self::default()
        }
    }

    /// Validates the options and fills in defaults. A missing id becomes a
    /// random uuid and a missing date becomes `now`.
    pub fn into_notification(self, now: OffsetDateTime) -> Result<Notification, CoreError> {
        let title = required(self.title, "title")?;
        let body = required(self.body, "body")?;
        let id = match self.id {
            Some(id) if id.trim().is_empty() => return Err(CoreError::invalid_id(id)),
            Some(id) => id,
            None => uuid::Uuid::new_v4().to_string(),
        };
        Ok(Notification {
            id,
            title,
            body,
            category: self.category.unwrap_or_default(),
            icon: self.icon.unwrap_or_default(),
            date: self.date.unwrap_or(now),
            expires: self.expires,
            buttons: self.buttons,
            on_select: self.on_select,
            on_close: self.on_close,
            on_expire: self.on_expire,
            custom_data: self.custom_data,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, CoreError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CoreError::MissingField(field)),
    }
}

/// The API surface seen by one client window.
///
/// Notification ids are scoped to the window's application.
pub struct NotificationApi {
    identity: Identity,
    store: Arc<Store>,
    registry: Arc<ClientRegistry>,
    center: Arc<CenterController>,
    clock: Clock,
}

impl NotificationApi {
    pub fn new(
        identity: Identity,
        store: Arc<Store>,
        registry: Arc<ClientRegistry>,
        center: Arc<CenterController>,
        clock: Clock,
    ) -> Self {
        Self {
            identity,
            store,
            registry,
            center,
            clock,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Shows a notification, replacing any live one with the same id.
    ///
    /// Invalid options are rejected before any state changes.
    pub async fn create(&self, options: NotificationOptions) -> Result<Notification, ApiError> {
        let notification = options.into_notification(self.clock.now())?;
        let stored = StoredNotification::new(self.identity.clone(), notification.clone());
        info!(notification_id = %stored.id, client = %self.identity, "Creating notification");
        self.store
            .dispatch(RootAction::CreateNotification(stored))
            .await?;
        Ok(notification)
    }

    /// Removes one of this application's notifications. Returns `false` if
    /// it does not exist.
    pub async fn clear(&self, id: &str) -> Result<bool, ApiError> {
        let key = composite_id(self.identity.app_id(), id);
        let Some(note) = self.store.state().notification(&key).cloned() else {
            return Ok(false);
        };
        self.store
            .dispatch(RootAction::RemoveNotifications(vec![note]))
            .await?;
        Ok(true)
    }

    /// This application's live notifications, oldest first.
    pub fn get_all(&self) -> Vec<Notification> {
        self.store
            .state()
            .notifications_for(self.identity.app_id())
            .map(|n| n.notification.clone())
            .collect()
    }

    /// Removes all of this application's notifications and returns how many
    /// there were.
    pub async fn clear_all(&self) -> Result<usize, ApiError> {
        let notes: Vec<StoredNotification> = self
            .store
            .state()
            .notifications_for(self.identity.app_id())
            .cloned()
            .collect();
        if notes.is_empty() {
            return Ok(0);
        }
        let count = notes.len();
        self.store
            .dispatch(RootAction::RemoveNotifications(notes))
            .await?;
        Ok(count)
    }

    pub async fn add_event_listener(&self, event_type: EventType) {
        self.registry
            .on_add_event_listener(event_type, &self.identity)
            .await;
    }

    pub fn remove_event_listener(&self, event_type: EventType) {
        self.registry
            .on_remove_event_listener(event_type, &self.identity);
    }

    /// Returns `false` if the request was ignored as fallout of a blur.
    pub async fn toggle_notification_center(&self) -> Result<bool, ApiError> {
        Ok(self.center.toggle(ToggleSource::Api).await?)
    }
}

impl std::fmt::Debug for NotificationApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationApi")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
