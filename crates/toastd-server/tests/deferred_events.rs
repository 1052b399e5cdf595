use std::sync::Arc;

use toastd_core::{ActionTrigger, EventType, Identity, NotificationEvent, StoredApplication};
use toastd_server::{
    Delivery, LocalEnvironment, LocalTransport, NotificationOptions, NotificationService,
};
use tokio::sync::mpsc;

struct Fixture {
    service: NotificationService,
    transport: Arc<LocalTransport>,
    environment: Arc<LocalEnvironment>,
    window: Identity,
    deliveries: mpsc::UnboundedReceiver<Delivery>,
}

async fn fixture() -> Fixture {
    let (transport, deliveries) = LocalTransport::new();
    let environment = Arc::new(LocalEnvironment::new());
    environment.register(StoredApplication::Programmatic {
        id: "mail".into(),
        title: "Mail".into(),
        initial_options: serde_json::json!({ "url": "https://mail.example.com" }),
        parent_uuid: None,
    });

    let window = Identity::new("mail", "inbox");
    transport.connect(window.clone());

    let service = NotificationService::builder(transport.clone())
        .with_environment(environment.clone())
        .build()
        .await
        .expect("service starts");

    Fixture {
        service,
        transport,
        environment,
        window,
        deliveries,
    }
}

fn selectable(id: &str) -> NotificationOptions {
    NotificationOptions {
        id: Some(id.to_string()),
        on_select: Some(serde_json::json!({ "open": id })),
        ..NotificationOptions::new("New mail", format!("Message {id}"))
    }
}

fn select_actions(deliveries: &mut mpsc::UnboundedReceiver<Delivery>) -> Vec<(String, String)> {
    let mut seen = Vec::new();
    while let Ok(delivery) = deliveries.try_recv() {
        if let NotificationEvent::Action {
            notification,
            trigger: ActionTrigger::Select,
            ..
        } = delivery.event
        {
            seen.push((delivery.target.name, notification.id));
        }
    }
    seen
}

#[tokio::test]
async fn deferred_actions_replayed_once_in_push_order() {
    let mut f = fixture().await;
    let api = f.service.api(f.window.clone());
    assert_eq!(
        f.service.store().state().application("mail").unwrap().title(),
        "Mail"
    );

    for id in ["1", "2", "3", "4"] {
        api.create(selectable(id)).await.unwrap();
        assert!(f.service.center().click_notification(&format!("mail:{id}")).await.unwrap());
    }

    assert!(select_actions(&mut f.deliveries).is_empty());
    assert_eq!(f.service.pump().deferred_len().await, 4);
    // launched for the first deferred event only
    assert_eq!(f.environment.launches(), vec!["mail"]);

    api.add_event_listener(EventType::NotificationAction).await;

    let replayed: Vec<String> = select_actions(&mut f.deliveries)
        .into_iter()
        .map(|(_, id)| id)
        .collect();
    assert_eq!(replayed, vec!["1", "2", "3", "4"]);
    assert_eq!(f.service.pump().deferred_len().await, 0);

    // a second ready window must not cause another replay
    let second = Identity::new("mail", "compose");
    f.transport.connect(second.clone());
    f.service
        .api(second)
        .add_event_listener(EventType::NotificationAction)
        .await;
    assert!(select_actions(&mut f.deliveries).is_empty());
}

#[tokio::test]
async fn replay_reaches_window_connected_after_defer() {
    let mut f = fixture().await;
    let api = f.service.api(f.window.clone());
    api.create(selectable("1")).await.unwrap();

    // the only window goes away before the user clicks
    f.transport.disconnect(&f.window);
    f.service.center().click_notification("mail:1").await.unwrap();
    assert_eq!(f.service.pump().deferred_len().await, 1);

    let relaunched = Identity::new("mail", "relaunched");
    f.transport.connect(relaunched.clone());
    f.service
        .api(relaunched)
        .add_event_listener(EventType::NotificationAction)
        .await;

    assert_eq!(
        select_actions(&mut f.deliveries),
        vec![("relaunched".to_string(), "1".to_string())]
    );
}

#[tokio::test]
async fn failed_launch_retried_on_next_deferred_event() {
    let f = fixture().await;
    let api = f.service.api(f.window.clone());
    api.create(selectable("1")).await.unwrap();
    api.create(selectable("2")).await.unwrap();

    f.environment.fail_launches(true);
    f.service.center().click_notification("mail:1").await.unwrap();
    assert!(f.environment.launches().is_empty());

    f.environment.fail_launches(false);
    f.service.center().click_notification("mail:2").await.unwrap();
    assert_eq!(f.environment.launches(), vec!["mail"]);
    assert_eq!(f.service.pump().deferred_len().await, 2);
}

#[tokio::test]
async fn ready_app_gets_actions_immediately() {
    let mut f = fixture().await;
    let api = f.service.api(f.window.clone());
    api.add_event_listener(EventType::NotificationAction).await;

    api.create(selectable("1")).await.unwrap();
    f.service.center().click_notification("mail:1").await.unwrap();

    assert_eq!(
        select_actions(&mut f.deliveries),
        vec![("inbox".to_string(), "1".to_string())]
    );
    assert!(f.environment.launches().is_empty());
}

#[tokio::test]
async fn exited_app_relaunched_by_next_deferred_event() {
    let f = fixture().await;
    let api = f.service.api(f.window.clone());
    api.create(selectable("1")).await.unwrap();
    api.create(selectable("2")).await.unwrap();

    f.service.center().click_notification("mail:1").await.unwrap();
    assert_eq!(f.environment.launches(), vec!["mail"]);

    // the app quits without ever listening for actions
    f.environment.set_running("mail", false);
    f.service.center().click_notification("mail:2").await.unwrap();
    assert_eq!(f.environment.launches(), vec!["mail", "mail"]);
    assert_eq!(f.service.pump().deferred_len().await, 2);
}
