//! Expiry scheduling.
//!
//! Expiring notifications live in one of two places: the armed slot, holding
//! the single notification with the earliest expiry and the only live
//! [`Timer`], or the pending list holding every other expiring notification.
//! After every mutation the armed note is the minimum of the whole expiring
//! set.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use time::OffsetDateTime;
use toastd_core::{Clock, HookError, Listener, OrderedList, StoredNotification, Timer};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::store::{ActionEvent, RootAction, Store};

#[derive(Debug, Clone)]
struct ExpiringNote {
    expires: OffsetDateTime,
    id: String,
    note: StoredNotification,
}

impl ExpiringNote {
    fn from_note(note: &StoredNotification) -> Option<Self> {
        note.expires_at().map(|expires| Self {
            expires,
            id: note.id.clone(),
            note: note.clone(),
        })
    }
}

/// Sooner expiry sorts last so `OrderedList::pop` yields the earliest one.
/// Equal timestamps fall back to the id, smaller ids expiring first.
fn soonest_last(a: &ExpiringNote, b: &ExpiringNote) -> Ordering {
    b.expires.cmp(&a.expires).then_with(|| b.id.cmp(&a.id))
}

type Comparator = fn(&ExpiringNote, &ExpiringNote) -> Ordering;

struct Armed {
    entry: ExpiringNote,
    // dropping the timer cancels the callback
    _timer: Timer,
}

struct Schedule {
    pending: OrderedList<ExpiringNote, Comparator>,
    armed: Option<Armed>,
}

/// Expires notifications at their scheduled time.
///
/// Connected to `Store::on_action`; reacts to created and removed
/// notifications. Expiring dispatches `ExpireNotification` then
/// `RemoveNotifications` as two separate actions.
pub struct ExpiryController {
    store: Weak<Store>,
    clock: Clock,
    schedule: Mutex<Schedule>,
    this: Weak<ExpiryController>,
}

impl ExpiryController {
    pub fn new(store: &Arc<Store>, clock: Clock) -> Arc<Self> {
        let store = Arc::downgrade(store);
        Arc::new_cyclic(|this| Self {
            store,
            clock,
            schedule: Mutex::new(Schedule {
                pending: OrderedList::new(Vec::new(), soonest_last as Comparator),
                armed: None,
            }),
            this: this.clone(),
        })
    }

    /// Schedules every expiring notification already in the store.
    ///
    /// Notifications whose expiry passed while the service was down are
    /// expired immediately.
    pub async fn init(&self) -> Result<(), StoreError> {
        if let Some(store) = self.store.upgrade() {
            let state = store.state();
            let mut schedule = self.lock();
            for entry in state.notifications.iter().filter_map(ExpiringNote::from_note) {
                schedule.pending.insert(entry);
            }
            debug!(pending = schedule.pending.len(), "Seeded expiry schedule");
        }
        self.run_schedule().await
    }

    /// Id and expiry of the notification the timer is armed for.
    pub fn next_expiry(&self) -> Option<(String, OffsetDateTime)> {
        self.lock()
            .armed
            .as_ref()
            .map(|armed| (armed.entry.id.clone(), armed.entry.expires))
    }

    /// Number of expiring notifications waiting behind the armed one.
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    fn lock(&self) -> MutexGuard<'_, Schedule> {
        self.schedule.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn on_create(&self, note: &StoredNotification) -> Result<(), StoreError> {
        let Some(entry) = ExpiringNote::from_note(note) else {
            return Ok(());
        };
        self.lock().pending.insert(entry);
        self.run_schedule().await
    }

    async fn on_remove(&self, notes: &[StoredNotification]) -> Result<(), StoreError> {
        let armed_removed = {
            let mut schedule = self.lock();
            for entry in notes.iter().filter_map(ExpiringNote::from_note) {
                schedule.pending.remove(&entry);
            }
            let armed_removed = schedule
                .armed
                .as_ref()
                .is_some_and(|armed| notes.iter().any(|n| n.id == armed.entry.id));
            if armed_removed {
                schedule.armed = None;
            }
            armed_removed
        };
        if armed_removed {
            self.run_schedule().await
        } else {
            Ok(())
        }
    }

    async fn on_timer(&self, id: String) {
        let due = {
            let mut schedule = self.lock();
            if schedule.armed.as_ref().is_some_and(|a| a.entry.id == id) {
                schedule.armed.take()
            } else {
                None
            }
        };
        if let Some(Armed { entry, .. }) = due
            && let Err(e) = self.expire_notification(entry.note).await
        {
            warn!(notification_id = %id, error = %e, "Failed to expire notification");
        }
        if let Err(e) = self.run_schedule().await {
            warn!(error = %e, "Failed to reschedule expiry");
        }
    }

    /// Arms the earliest expiring note, expiring overdue ones on the spot.
    ///
    /// Every due note is processed even if one fails; the first failure is
    /// returned.
    async fn run_schedule(&self) -> Result<(), StoreError> {
        let mut first_error = None;
        while let Some(due) = self.arm_earliest() {
            if let Err(e) = self.expire_notification(due.note).await {
                warn!(notification_id = %due.id, error = %e, "Failed to expire notification");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Moves the earliest pending note into the armed slot if it is sooner
    /// than the armed one. Returns it instead when it is already overdue.
    fn arm_earliest(&self) -> Option<ExpiringNote> {
        let mut schedule = self.lock();
        let candidate = schedule.pending.peek()?;
        if let Some(armed) = &schedule.armed
            && soonest_last(candidate, &armed.entry) != Ordering::Greater
        {
            return None;
        }
        let candidate = schedule.pending.pop()?;
        if let Some(demoted) = schedule.armed.take() {
            schedule.pending.insert(demoted.entry);
        }

        let delay = self.clock.until(candidate.expires);
        if delay.is_zero() {
            return Some(candidate);
        }

        let mut timer = Timer::new(delay);
        let this = self.this.clone();
        let id = candidate.id.clone();
        timer.start_with(async move {
            if let Some(controller) = this.upgrade() {
                controller.on_timer(id).await;
            }
        });
        debug!(notification_id = %candidate.id, delay_ms = delay.as_millis() as u64, "Armed expiry timer");
        schedule.armed = Some(Armed {
            entry: candidate,
            _timer: timer,
        });
        None
    }

    async fn expire_notification(&self, note: StoredNotification) -> Result<(), StoreError> {
        let Some(store) = self.store.upgrade() else {
            return Ok(());
        };
        info!(notification_id = %note.id, "Expiring notification");
        store
            .dispatch(RootAction::ExpireNotification(note.clone()))
            .await?;
        store
            .dispatch(RootAction::RemoveNotifications(vec![note]))
            .await
    }
}

#[async_trait]
impl Listener<ActionEvent> for ExpiryController {
    fn name(&self) -> &str {
        "expiry"
    }

    async fn handle(&self, event: &ActionEvent) -> Result<(), HookError> {
        match &event.action {
            RootAction::CreateNotification(note) => self.on_create(note).await?,
            RootAction::RemoveNotifications(notes) => self.on_remove(notes).await?,
            _ => {}
        }
        Ok(())
    }

    fn matches(&self, event: &ActionEvent) -> bool {
        matches!(
            event.action,
            RootAction::CreateNotification(_) | RootAction::RemoveNotifications(_)
        )
    }
}

impl std::fmt::Debug for ExpiryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let schedule = self.lock();
        f.debug_struct("ExpiryController")
            .field("pending", &schedule.pending.len())
            .field("armed", &schedule.armed.as_ref().map(|a| &a.entry.id))
            .finish()
    }
}
