use crate::helpers::{ScriptedPushClient, drain, next_event, sender_config, wait_until};

use receiver_core::store::{MemoryStore, PERSISTENT_IDS_KEY, KeyValueStore};
use receiver_core::{
    ChannelTarget, IncomingMessage, ListenOptions, ReceiverEvent, start_push_receiver,
};

use std::sync::Arc;

use serde_json::json;

/// **VALUE**: Verifies the host entry point end to end: requests in, events out.
///
/// **WHY THIS MATTERS**: Hosts only ever touch `start_push_receiver` and the handle.
/// Requests must be dispatched concurrently yet still run registration once.
///
/// **BUG THIS CATCHES**: Would catch the dispatcher handling requests without the
/// coordinator, or a dispatcher that stops after the first request.
#[tokio::test]
async fn given_three_start_requests_when_dispatched_then_single_registration_and_three_started() {
    // GIVEN: A running receiver
    let client = Arc::new(ScriptedPushClient::new());
    let (target, mut events) = ChannelTarget::new();
    let handle = start_push_receiver(
        client.clone(),
        Arc::new(MemoryStore::new()),
        Arc::new(target),
        ListenOptions::default(),
    );

    // WHEN: Three start requests are sent
    for _ in 0..3 {
        handle.request_start(sender_config("key-A")).await.unwrap();
    }

    // THEN: Three service-started events, one token update, one registration
    let mut started = 0;
    let mut updated = 0;
    while started < 3 {
        match next_event(&mut events).await {
            ReceiverEvent::ServiceStarted { token } => {
                assert_eq!(token.as_deref(), Some("token-1"));
                started += 1;
            }
            ReceiverEvent::TokenUpdated { .. } => updated += 1,
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(updated, 1);
    assert_eq!(client.register_count(), 1);
    assert_eq!(client.listen_count(), 1);
    assert!(handle.coordinator().is_started().await);
}

/// **VALUE**: Verifies delivery through the full stack, including a destroyed consumer.
///
/// **WHY THIS MATTERS**: When the consumer window closes, pushes keep arriving. They must
/// be recorded so they are not replayed, but not sent into a dead consumer.
///
/// **BUG THIS CATCHES**: Would catch delivery suppression also suppressing persistence.
#[tokio::test]
async fn given_started_receiver_when_consumer_destroyed_then_ids_still_recorded() {
    // GIVEN: A started receiver
    let client = Arc::new(ScriptedPushClient::new());
    let store = Arc::new(MemoryStore::new());
    let (target, mut events) = ChannelTarget::new();
    let handle = start_push_receiver(
        client.clone(),
        store.clone(),
        Arc::new(target.clone()),
        ListenOptions::default(),
    );
    handle.request_start(sender_config("key-A")).await.unwrap();
    wait_until(|| client.listen_count() == 1).await;
    // TokenUpdated, ServiceStarted
    next_event(&mut events).await;
    next_event(&mut events).await;

    // WHEN: One push arrives while the consumer is alive, one after it is destroyed
    let sender = client.notification_sender();
    sender.deliver(IncomingMessage::new(json!({"title": "alive"}), "p1"));
    assert_eq!(
        next_event(&mut events).await,
        ReceiverEvent::NotificationReceived {
            notification: json!({"title": "alive"}),
            persistent_id: "p1".into(),
        }
    );

    target.destroy();
    sender.deliver(IncomingMessage::new(json!({"title": "gone"}), "p2"));

    // THEN: Both ids are recorded, only the first was forwarded
    wait_until(|| {
        store.get(PERSISTENT_IDS_KEY).unwrap() == Some(json!(["p1", "p2"]))
    })
    .await;
    assert!(drain(&mut events).is_empty());
}
