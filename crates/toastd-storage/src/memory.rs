//! In-memory collection backed by `DashMap`.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;

use crate::error::DatabaseError;
use crate::traits::{Collection, Record};

/// Collection kept entirely in memory.
///
/// Every write stamps the record with a monotonically increasing sequence
/// number so `get_all` returns records in write order, matching the order
/// notifications were created in.
#[derive(Debug)]
pub struct InMemoryCollection<T: Record> {
    name: String,
    records: DashMap<String, (u64, T)>,
    sequence: AtomicU64,
}

impl<T: Record> InMemoryCollection<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: DashMap::new(),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl<T: Record> Collection<T> for InMemoryCollection<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, id: &str) -> Result<Option<T>, DatabaseError> {
        Ok(self.records.get(id).map(|entry| entry.value().1.clone()))
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<T>, DatabaseError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.records.get(id).map(|entry| entry.value().1.clone()))
            .collect())
    }

    async fn get_all(&self) -> Result<Vec<T>, DatabaseError> {
        let mut all: Vec<(u64, T)> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by_key(|(seq, _)| *seq);
        Ok(all.into_iter().map(|(_, record)| record).collect())
    }

    async fn upsert(&self, records: &[T]) -> Result<(), DatabaseError> {
        for record in records {
            let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
            self.records
                .insert(record.record_id().to_string(), (seq, record.clone()));
        }
        trace!(collection = %self.name, count = records.len(), "Upserted records");
        Ok(())
    }

    async fn delete(&self, ids: &[String]) -> Result<(), DatabaseError> {
        for id in ids {
            self.records.remove(id);
        }
        trace!(collection = %self.name, count = ids.len(), "Deleted records");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use toastd_core::{Identity, Notification, StoredApplication, StoredNotification};

    fn stored(app: &str, id: &str) -> StoredNotification {
        StoredNotification::new(
            Identity::new(app, "main"),
            Notification {
                id: id.to_string(),
                title: "Title".into(),
                body: "Body".into(),
                category: String::new(),
                icon: String::new(),
                date: datetime!(2024-01-01 00:00 UTC),
                expires: None,
                buttons: Vec::new(),
                on_select: None,
                on_close: None,
                on_expire: None,
                custom_data: serde_json::Map::new(),
            },
        )
    }

    #[tokio::test]
    async fn test_crud() {
        let collection = InMemoryCollection::new("notifications");
        collection
            .upsert(&[stored("app", "a"), stored("app", "b")])
            .await
            .unwrap();

        assert_eq!(collection.len(), 2);
        assert!(collection.get("app:a").await.unwrap().is_some());
        assert!(collection.get("app:zzz").await.unwrap().is_none());

        let many = collection
            .get_many(&["app:b".to_string(), "app:missing".to_string()])
            .await
            .unwrap();
        assert_eq!(many.len(), 1);
        assert_eq!(many[0].id, "app:b");

        collection.delete(&["app:a".to_string()]).await.unwrap();
        assert_eq!(collection.len(), 1);
    }

    #[tokio::test]
    async fn test_get_all_in_write_order() {
        let collection = InMemoryCollection::new("notifications");
        for id in ["c", "a", "b"] {
            collection.upsert(&[stored("app", id)]).await.unwrap();
        }
        // Re-writing moves the record to the end
        collection.upsert(&[stored("app", "c")]).await.unwrap();

        let ids: Vec<String> = collection
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["app:a", "app:b", "app:c"]);
    }

    #[tokio::test]
    async fn test_applications_keyed_by_id() {
        let collection = InMemoryCollection::new("applications");
        let app = StoredApplication::Programmatic {
            id: "app-1".into(),
            title: "App".into(),
            initial_options: serde_json::json!({"url": "about:blank"}),
            parent_uuid: None,
        };
        collection.upsert(&[app.clone()]).await.unwrap();
        assert_eq!(collection.get("app-1").await.unwrap(), Some(app));
    }
}
