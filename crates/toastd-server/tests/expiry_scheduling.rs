use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use time::macros::datetime;
use toastd_core::{ActionTrigger, Clock, EventType, HookError, Identity, Listener, NotificationEvent};
use toastd_server::{
    ActionEvent, Delivery, LocalTransport, NotificationOptions, NotificationService, RootAction,
};
use tokio::sync::mpsc;

const START: OffsetDateTime = datetime!(2024-03-01 09:00 UTC);

#[derive(Default)]
struct Removals {
    ids: Mutex<Vec<String>>,
}

#[async_trait]
impl Listener<ActionEvent> for Removals {
    fn name(&self) -> &str {
        "removals"
    }

    async fn handle(&self, event: &ActionEvent) -> Result<(), HookError> {
        if let RootAction::RemoveNotifications(notes) = &event.action {
            let mut ids = self.ids.lock().unwrap();
            ids.extend(notes.iter().map(|n| n.notification.id.clone()));
        }
        Ok(())
    }
}

struct Fixture {
    service: NotificationService,
    window: Identity,
    removals: Arc<Removals>,
    deliveries: mpsc::UnboundedReceiver<Delivery>,
}

async fn fixture() -> Fixture {
    let (transport, deliveries) = LocalTransport::new();
    let window = Identity::new("calendar", "main");
    transport.connect(window.clone());

    let service = NotificationService::builder(transport)
        .with_clock(Clock::starting_at(START))
        .build()
        .await
        .expect("service starts");
    service
        .api(window.clone())
        .add_event_listener(EventType::NotificationAction)
        .await;

    let removals = Arc::new(Removals::default());
    service.store().on_action().connect(removals.clone()).await;

    Fixture {
        service,
        window,
        removals,
        deliveries,
    }
}

fn expiring(id: &str, after_ms: i64) -> NotificationOptions {
    NotificationOptions {
        id: Some(id.to_string()),
        expires: Some(START + time::Duration::milliseconds(after_ms)),
        on_expire: Some(serde_json::json!({ "expired": id })),
        ..NotificationOptions::new(format!("Reminder {id}"), "Meeting soon")
    }
}

fn expire_actions(deliveries: &mut mpsc::UnboundedReceiver<Delivery>) -> Vec<String> {
    let mut ids = Vec::new();
    while let Ok(delivery) = deliveries.try_recv() {
        if let NotificationEvent::Action {
            notification,
            trigger: ActionTrigger::Expire,
            ..
        } = delivery.event
        {
            ids.push(notification.id);
        }
    }
    ids
}

#[tokio::test(start_paused = true)]
async fn notes_expire_in_order_with_expire_trigger() {
    let mut f = fixture().await;
    let api = f.service.api(f.window.clone());

    api.create(expiring("a", 5_000)).await.unwrap();
    api.create(expiring("b", 10_000)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(10_001)).await;

    assert_eq!(*f.removals.ids.lock().unwrap(), vec!["a", "b"]);
    assert_eq!(expire_actions(&mut f.deliveries), vec!["a", "b"]);
    assert!(api.get_all().is_empty());
}

#[tokio::test(start_paused = true)]
async fn creation_order_does_not_matter() {
    let f = fixture().await;
    let api = f.service.api(f.window.clone());

    for (id, after) in [("d", 4_000), ("b", 2_000), ("c", 3_000), ("a", 1_000)] {
        api.create(expiring(id, after)).await.unwrap();
    }
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(*f.removals.ids.lock().unwrap(), vec!["a", "b", "c", "d"]);
}

#[tokio::test(start_paused = true)]
async fn equal_expiry_expires_together_ordered_by_id() {
    let f = fixture().await;
    let api = f.service.api(f.window.clone());

    api.create(expiring("y", 3_000)).await.unwrap();
    api.create(expiring("x", 3_000)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(2_999)).await;
    assert!(f.removals.ids.lock().unwrap().is_empty());

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(*f.removals.ids.lock().unwrap(), vec!["x", "y"]);
}

#[tokio::test(start_paused = true)]
async fn past_expiry_expires_before_create_returns() {
    let mut f = fixture().await;
    let api = f.service.api(f.window.clone());

    api.create(expiring("late", -1_000)).await.unwrap();

    assert_eq!(*f.removals.ids.lock().unwrap(), vec!["late"]);
    let events: Vec<EventType> = std::iter::from_fn(|| f.deliveries.try_recv().ok())
        .map(|d| d.event.event_type())
        .collect();
    assert_eq!(
        events,
        vec![
            EventType::NotificationCreated,
            EventType::NotificationAction,
            EventType::NotificationClosed,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn cleared_note_never_expires() {
    let f = fixture().await;
    let api = f.service.api(f.window.clone());

    api.create(expiring("a", 1_000)).await.unwrap();
    api.create(expiring("b", 2_000)).await.unwrap();
    assert!(api.clear("a").await.unwrap());

    let expiry = f.service.expiry().expect("expiry enabled");
    assert_eq!(expiry.next_expiry().map(|(id, _)| id), Some("calendar:b".to_string()));

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(*f.removals.ids.lock().unwrap(), vec!["a", "b"]);
}
