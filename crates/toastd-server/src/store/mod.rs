//! Reducer-based state container.
//!
//! The store owns the single [`RootState`]. Every dispatch reduces the state
//! synchronously, then awaits every `on_action` listener before returning, so
//! a caller awaiting `dispatch` knows persistence and client delivery for that
//! action have finished (or failed).

mod actions;
mod state;

pub use actions::{RootAction, reduce};
pub use state::RootState;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use arc_swap::ArcSwap;
use toastd_core::{Signal, StoredNotification};
use toastd_storage::Database;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::StoreError;

/// Payload delivered to `on_action` listeners after a commit.
#[derive(Debug, Clone)]
pub struct ActionEvent {
    pub action: RootAction,
    /// State right after this action was reduced
    pub state: Arc<RootState>,
}

type Watcher = Box<dyn Fn(&RootState, &RootState) + Send + Sync>;

pub struct Store {
    state: ArcSwap<RootState>,
    watchers: RwLock<Vec<Watcher>>,
    on_action: Signal<ActionEvent>,
    database: Database,
    initialized: watch::Sender<bool>,
}

impl Store {
    pub fn new(database: Database) -> Self {
        let (initialized, _) = watch::channel(false);
        Self {
            state: ArcSwap::from_pointee(RootState::default()),
            watchers: RwLock::new(Vec::new()),
            on_action: Signal::new(),
            database,
            initialized,
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> Arc<RootState> {
        self.state.load_full()
    }

    pub fn on_action(&self) -> &Signal<ActionEvent> {
        &self.on_action
    }

    /// Hydrates the state from the database.
    ///
    /// Persisted notifications sharing an id collapse to the most recently
    /// written one.
    pub async fn init(&self) -> Result<(), StoreError> {
        let persisted = self
            .database
            .notifications
            .get_all()
            .await
            .map_err(StoreError::Init)?;
        let applications = self
            .database
            .applications
            .get_all()
            .await
            .map_err(StoreError::Init)?;

        let mut notifications: Vec<StoredNotification> = Vec::with_capacity(persisted.len());
        for note in persisted {
            notifications.retain(|n| n.id != note.id);
            notifications.push(note);
        }
        let applications: HashMap<_, _> = applications
            .into_iter()
            .map(|app| (app.id().to_string(), app))
            .collect();

        info!(
            notifications = notifications.len(),
            applications = applications.len(),
            "Store initialized from storage"
        );

        self.state.rcu(|current| RootState {
            notifications: Arc::new(notifications.clone()),
            applications: Arc::new(applications.clone()),
            ..(**current).clone()
        });
        self.initialized.send_replace(true);
        Ok(())
    }

    /// Resolves once `init` has completed.
    pub async fn initialized(&self) {
        let mut ready = self.initialized.subscribe();
        // The sender lives as long as the store, so this only ends on `true`
        let _ = ready.wait_for(|ready| *ready).await;
    }

    pub fn is_initialized(&self) -> bool {
        *self.initialized.borrow()
    }

    /// Applies `action` and waits for every listener to settle.
    ///
    /// A returned error means a listener failed after the in-memory state was
    /// already committed; the state is not rolled back.
    pub async fn dispatch(&self, action: RootAction) -> Result<(), StoreError> {
        if let RootAction::CreateNotification(note) = &action
            && let Some(existing) = self.state().notification(&note.id).cloned()
        {
            debug!(notification_id = %note.id, "Replacing existing notification");
            self.commit(RootAction::RemoveNotifications(vec![existing]))
                .await?;
        }
        self.commit(action).await
    }

    /// Calls `observer(new, old)` whenever the value picked by `selector`
    /// differs between two consecutive states.
    pub fn watch_for_change<T, S, O>(&self, selector: S, observer: O)
    where
        T: PartialEq,
        S: Fn(&RootState) -> T + Send + Sync + 'static,
        O: Fn(&T, &T) + Send + Sync + 'static,
    {
        let watcher: Watcher = Box::new(move |next, previous| {
            let new_value = selector(next);
            let old_value = selector(previous);
            if new_value != old_value {
                observer(&new_value, &old_value);
            }
        });
        self.watchers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(watcher);
    }

    async fn commit(&self, action: RootAction) -> Result<(), StoreError> {
        let mut committed = None;
        let previous = self.state.rcu(|current| {
            let next = Arc::new(reduce(current, &action));
            committed = Some(next.clone());
            next
        });
        let next = committed.unwrap_or_else(|| self.state.load_full());
        debug!(action = action.name(), "Committed action");

        {
            let watchers = self.watchers.read().unwrap_or_else(PoisonError::into_inner);
            for watcher in watchers.iter() {
                watcher(&next, &previous);
            }
        }

        let event = ActionEvent {
            action,
            state: next,
        };
        let mut failures = self.on_action.emit(&event).await.into_iter();
        match failures.next() {
            None => Ok(()),
            Some(first) => {
                for rest in failures {
                    debug!(
                        action = event.action.name(),
                        listener = %rest.listener,
                        "Additional listener failure"
                    );
                }
                Err(StoreError::Listener {
                    listener: first.listener,
                    source: first.error,
                })
            }
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state.load())
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}
