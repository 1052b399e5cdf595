//! Persistence traits.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use toastd_core::{StoredApplication, StoredNotification};

use crate::error::DatabaseError;
use crate::memory::InMemoryCollection;

/// A value that can be stored in a [`Collection`].
///
/// Records are serde types so that durable backends can encode them.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Primary key of the record.
    fn record_id(&self) -> &str;
}

impl Record for StoredNotification {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for StoredApplication {
    fn record_id(&self) -> &str {
        self.id()
    }
}

/// Keyed CRUD contract every persistence backend implements.
///
/// All methods report infrastructure failures as [`DatabaseError`]; a
/// missing record is not an error.
#[async_trait]
pub trait Collection<T: Record>: Send + Sync {
    /// Collection name (for logging and error context).
    fn name(&self) -> &str;

    /// Reads one record by id.
    async fn get(&self, id: &str) -> Result<Option<T>, DatabaseError>;

    /// Reads every record whose id is in `ids`, skipping unknown ids.
    async fn get_many(&self, ids: &[String]) -> Result<Vec<T>, DatabaseError>;

    /// Reads every record, oldest write first.
    async fn get_all(&self) -> Result<Vec<T>, DatabaseError>;

    /// Inserts or replaces records by id.
    async fn upsert(&self, records: &[T]) -> Result<(), DatabaseError>;

    /// Deletes records by id. Unknown ids are ignored.
    async fn delete(&self, ids: &[String]) -> Result<(), DatabaseError>;
}

/// The collections backing the service.
#[derive(Clone)]
pub struct Database {
    pub notifications: Arc<dyn Collection<StoredNotification>>,
    pub applications: Arc<dyn Collection<StoredApplication>>,
}

impl Database {
    pub fn new(
        notifications: Arc<dyn Collection<StoredNotification>>,
        applications: Arc<dyn Collection<StoredApplication>>,
    ) -> Self {
        Self {
            notifications,
            applications,
        }
    }

    /// Database held entirely in memory.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryCollection::new("notifications")),
            Arc::new(InMemoryCollection::new("applications")),
        )
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("notifications", &self.notifications.name())
            .field("applications", &self.applications.name())
            .finish()
    }
}
