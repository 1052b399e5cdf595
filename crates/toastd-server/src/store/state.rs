use std::collections::HashMap;
use std::sync::Arc;

use toastd_core::{StoredApplication, StoredNotification};

/// Complete service state.
///
/// Never mutated in place: every reduce builds a new value and shares the
/// untouched collections with the previous one through their `Arc`s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootState {
    /// Live notifications in creation order, at most one per composite id
    pub notifications: Arc<Vec<StoredNotification>>,
    /// Launch metadata keyed by application uuid
    pub applications: Arc<HashMap<String, StoredApplication>>,
    pub center_visible: bool,
    pub center_locked: bool,
}

impl RootState {
    pub fn notification(&self, id: &str) -> Option<&StoredNotification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    /// Notifications owned by `app_id`, in creation order.
    pub fn notifications_for(&self, app_id: &str) -> impl Iterator<Item = &StoredNotification> {
        self.notifications.iter().filter(move |n| n.app_id() == app_id)
    }

    pub fn application(&self, app_id: &str) -> Option<&StoredApplication> {
        self.applications.get(app_id)
    }
}
