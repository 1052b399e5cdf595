//! Store actions and the reducer.

use std::collections::HashMap;
use std::sync::Arc;

use toastd_core::{StoredApplication, StoredNotification, ToggleSource};

use super::state::RootState;

/// Every transition the store accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum RootAction {
    /// Adds a notification. Any live notification with the same composite id
    /// is removed first by the store, in its own transaction.
    CreateNotification(StoredNotification),
    RemoveNotifications(Vec<StoredNotification>),
    /// The notification body was clicked.
    ClickNotification(StoredNotification),
    ClickButton {
        notification: StoredNotification,
        button_index: usize,
    },
    /// The notification reached its expiry time. A `RemoveNotifications`
    /// always follows as a separate transaction.
    ExpireNotification(StoredNotification),
    ToggleCenterVisibility {
        source: ToggleSource,
        /// `None` flips the current visibility
        visible: Option<bool>,
    },
    BlurCenter,
    ToggleLockCenter,
    RegisterApplication(StoredApplication),
}

impl RootAction {
    pub fn name(&self) -> &'static str {
        match self {
            RootAction::CreateNotification(_) => "create-notification",
            RootAction::RemoveNotifications(_) => "remove-notifications",
            RootAction::ClickNotification(_) => "click-notification",
            RootAction::ClickButton { .. } => "click-button",
            RootAction::ExpireNotification(_) => "expire-notification",
            RootAction::ToggleCenterVisibility { .. } => "toggle-center-visibility",
            RootAction::BlurCenter => "blur-center",
            RootAction::ToggleLockCenter => "toggle-lock-center",
            RootAction::RegisterApplication(_) => "register-application",
        }
    }
}

/// Computes the state that follows `action`.
///
/// Pure: `state` is never modified, collections an action does not touch are
/// shared with the returned state.
pub fn reduce(state: &RootState, action: &RootAction) -> RootState {
    match action {
        RootAction::CreateNotification(note) => {
            let mut notifications = Vec::with_capacity(state.notifications.len() + 1);
            notifications.extend(
                state
                    .notifications
                    .iter()
                    .filter(|n| n.id != note.id)
                    .cloned(),
            );
            notifications.push(note.clone());
            RootState {
                notifications: Arc::new(notifications),
                ..state.clone()
            }
        }
        RootAction::RemoveNotifications(removed) => {
            let notifications: Vec<StoredNotification> = state
                .notifications
                .iter()
                .filter(|n| !removed.iter().any(|r| r.id == n.id))
                .cloned()
                .collect();
            RootState {
                notifications: Arc::new(notifications),
                ..state.clone()
            }
        }
        RootAction::ClickNotification(_)
        | RootAction::ClickButton { .. }
        | RootAction::ExpireNotification(_) => state.clone(),
        RootAction::ToggleCenterVisibility { visible, .. } => RootState {
            center_visible: visible.unwrap_or(!state.center_visible),
            ..state.clone()
        },
        RootAction::BlurCenter => RootState {
            center_visible: state.center_visible && state.center_locked,
            ..state.clone()
        },
        RootAction::ToggleLockCenter => RootState {
            center_locked: !state.center_locked,
            ..state.clone()
        },
        RootAction::RegisterApplication(app) => {
            let mut applications: HashMap<String, StoredApplication> =
                (*state.applications).clone();
            applications.insert(app.id().to_string(), app.clone());
            RootState {
                applications: Arc::new(applications),
                ..state.clone()
            }
        }
    }
}
