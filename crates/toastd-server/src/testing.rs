//! Fixtures shared by the unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use time::macros::datetime;
use toastd_core::{HookError, Identity, Listener, Notification, StoredApplication, StoredNotification};

use crate::store::ActionEvent;

pub fn note(id: &str) -> Notification {
    Notification {
        id: id.to_string(),
        title: format!("Title {id}"),
        body: "Body".to_string(),
        category: String::new(),
        icon: String::new(),
        date: datetime!(2024-01-01 00:00 UTC),
        expires: None,
        buttons: Vec::new(),
        on_select: None,
        on_close: None,
        on_expire: None,
        custom_data: serde_json::Map::new(),
    }
}

pub fn stored(app_id: &str, id: &str) -> StoredNotification {
    StoredNotification::new(Identity::new(app_id, "main"), note(id))
}

pub fn expiring(app_id: &str, id: &str, expires: OffsetDateTime) -> StoredNotification {
    let mut n = note(id);
    n.expires = Some(expires);
    StoredNotification::new(Identity::new(app_id, "main"), n)
}

pub fn app(id: &str, title: &str) -> StoredApplication {
    StoredApplication::Manifest {
        id: id.to_string(),
        title: title.to_string(),
        manifest_url: format!("https://apps.example.com/{id}.json"),
    }
}

/// Records every action seen on the store.
#[derive(Default)]
pub struct RecordingListener {
    seen: Mutex<Vec<ActionEvent>>,
}

impl RecordingListener {
    pub fn actions(&self) -> Vec<&'static str> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.action.name())
            .collect()
    }

    pub fn events(&self) -> Vec<ActionEvent> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last_state_len(&self) -> Option<usize> {
        self.seen
            .lock()
            .unwrap()
            .last()
            .map(|e| e.state.notifications.len())
    }
}

#[async_trait]
impl Listener<ActionEvent> for RecordingListener {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn handle(&self, event: &ActionEvent) -> Result<(), HookError> {
        self.seen.lock().unwrap().push(event.clone());
        Ok(())
    }
}
