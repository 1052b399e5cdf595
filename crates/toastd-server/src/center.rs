//! Notification Center interactions.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use toastd_core::{ToggleFilter, ToggleSource};
use tracing::debug;

use crate::error::StoreError;
use crate::store::{RootAction, Store};

/// Handles user interaction with the Notification Center.
///
/// Toggle and blur requests pass through a [`ToggleFilter`] so a single
/// click that produces both a blur and a toggle does not make the center
/// flicker.
pub struct CenterController {
    store: Arc<Store>,
    filter: Mutex<ToggleFilter>,
}

impl CenterController {
    pub fn new(store: Arc<Store>, blur_toggle_block: Duration, toggle_blur_block: Duration) -> Self {
        Self {
            store,
            filter: Mutex::new(ToggleFilter::new(blur_toggle_block, toggle_blur_block)),
        }
    }

    /// Flips center visibility. Returns `false` if the request was filtered.
    pub async fn toggle(&self, source: ToggleSource) -> Result<bool, StoreError> {
        let accepted = self
            .filter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_toggle(source);
        if !accepted {
            debug!(?source, "Ignoring toggle right after blur");
            return Ok(false);
        }
        self.store
            .dispatch(RootAction::ToggleCenterVisibility {
                source,
                visible: None,
            })
            .await?;
        Ok(true)
    }

    /// Hides the center unless it is locked. Returns `false` if the blur was
    /// filtered.
    pub async fn blur(&self) -> Result<bool, StoreError> {
        let accepted = self
            .filter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_blur();
        if !accepted {
            debug!("Ignoring blur right after toggle");
            return Ok(false);
        }
        self.store.dispatch(RootAction::BlurCenter).await?;
        Ok(true)
    }

    pub async fn toggle_lock(&self) -> Result<(), StoreError> {
        self.store.dispatch(RootAction::ToggleLockCenter).await
    }

    /// Activates a notification and dismisses it. Returns `false` if no live
    /// notification has `id`.
    pub async fn click_notification(&self, id: &str) -> Result<bool, StoreError> {
        let Some(note) = self.store.state().notification(id).cloned() else {
            return Ok(false);
        };
        self.store
            .dispatch(RootAction::ClickNotification(note.clone()))
            .await?;
        self.store
            .dispatch(RootAction::RemoveNotifications(vec![note]))
            .await?;
        Ok(true)
    }

    /// Presses a notification button and dismisses the notification.
    pub async fn click_button(&self, id: &str, button_index: usize) -> Result<bool, StoreError> {
        let Some(note) = self.store.state().notification(id).cloned() else {
            return Ok(false);
        };
        if button_index >= note.notification.buttons.len() {
            debug!(notification_id = %id, button_index, "No such button");
            return Ok(false);
        }
        self.store
            .dispatch(RootAction::ClickButton {
                notification: note.clone(),
                button_index,
            })
            .await?;
        self.store
            .dispatch(RootAction::RemoveNotifications(vec![note]))
            .await?;
        Ok(true)
    }

    /// Dismisses a notification from the center.
    pub async fn close(&self, id: &str) -> Result<bool, StoreError> {
        let Some(note) = self.store.state().notification(id).cloned() else {
            return Ok(false);
        };
        self.store
            .dispatch(RootAction::RemoveNotifications(vec![note]))
            .await?;
        Ok(true)
    }

    /// Dismisses every notification. Returns how many were removed.
    pub async fn clear_all(&self) -> Result<usize, StoreError> {
        let notes = self.store.state().notifications.to_vec();
        if notes.is_empty() {
            return Ok(0);
        }
        let count = notes.len();
        self.store
            .dispatch(RootAction::RemoveNotifications(notes))
            .await?;
        Ok(count)
    }
}

impl std::fmt::Debug for CenterController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CenterController").finish_non_exhaustive()
    }
}
