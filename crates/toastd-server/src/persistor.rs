//! Store listener that mirrors committed actions into the database.

use async_trait::async_trait;
use toastd_core::{HookError, Listener};
use toastd_storage::Database;
use tracing::debug;

use crate::store::{ActionEvent, RootAction};

/// Writes notifications and applications through to storage.
///
/// Runs inside the store's await-all fan-out: a failed write surfaces as the
/// error of the `dispatch` call that triggered it, wrapping the original
/// `DatabaseError`.
pub struct Persistor {
    database: Database,
}

impl Persistor {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl Listener<ActionEvent> for Persistor {
    fn name(&self) -> &str {
        "persistor"
    }

    async fn handle(&self, event: &ActionEvent) -> Result<(), HookError> {
        match &event.action {
            RootAction::CreateNotification(note) => {
                self.database
                    .notifications
                    .upsert(std::slice::from_ref(note))
                    .await
                    .map_err(HookError::database)?;
                debug!(notification_id = %note.id, "Persisted notification");
            }
            RootAction::RemoveNotifications(notes) => {
                let ids: Vec<String> = notes.iter().map(|n| n.id.clone()).collect();
                self.database
                    .notifications
                    .delete(&ids)
                    .await
                    .map_err(HookError::database)?;
                debug!(count = ids.len(), "Deleted persisted notifications");
            }
            RootAction::RegisterApplication(app) => {
                self.database
                    .applications
                    .upsert(std::slice::from_ref(app))
                    .await
                    .map_err(HookError::database)?;
                debug!(app_id = %app.id(), "Persisted application");
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
                | RootAction::RegisterApplication(_)
        )
    }
}

impl std::fmt::Debug for Persistor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistor")
            .field("database", &self.database)
            .finish()
    }
}
