use crate::helpers::{ScriptedPushClient, next_event, sender_config, wait_until};

use receiver_core::store::{JsonFileStore, PersistentStateStore};
use receiver_core::{
    ChannelTarget, IncomingMessage, ListenOptions, PersistentId, ReceiverEvent, StartOutcome,
    StartupCoordinator,
};

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

fn boot(
    dir: &Path,
    client: Arc<ScriptedPushClient>,
) -> (
    StartupCoordinator,
    PersistentStateStore,
    tokio::sync::mpsc::UnboundedReceiver<ReceiverEvent>,
) {
    let store = PersistentStateStore::new(Arc::new(JsonFileStore::open(dir).unwrap()));
    let (target, events) = ChannelTarget::new();
    let coordinator = StartupCoordinator::new(
        client,
        store.clone(),
        Arc::new(target),
        ListenOptions::default(),
    );
    (coordinator, store, events)
}

/// **VALUE**: Verifies that a restarted process resumes without registering or replaying.
///
/// **WHY THIS MATTERS**: This is the reason state is persisted at all. After a restart
/// the receiver must reuse its credentials and hand the full delivered-id history to
/// the listen client so history is not delivered again.
///
/// **BUG THIS CATCHES**: Would catch ids or credentials only living in memory, or the
/// history not being passed to listen.
#[tokio::test]
async fn given_previous_session_when_process_restarts_then_resumes_with_history() {
    let dir = tempfile::tempdir().unwrap();

    // GIVEN: A first session that registered and delivered two pushes
    {
        let client = Arc::new(ScriptedPushClient::new());
        let (coordinator, store, mut events) = boot(dir.path(), client.clone());
        assert!(matches!(
            coordinator.start(sender_config("key-A")).await,
            StartOutcome::Started { .. }
        ));

        let sender = client.notification_sender();
        sender.deliver(IncomingMessage::new(json!({"title": "one"}), "p1"));
        sender.deliver(IncomingMessage::new(json!({"title": "two"}), "p2"));

        wait_until(|| store.delivered_ids().unwrap().len() == 2).await;
        // TokenUpdated, ServiceStarted, then the two notifications
        for _ in 0..4 {
            next_event(&mut events).await;
        }
    }

    // WHEN: A new process opens the same store and starts with the same key
    let client = Arc::new(ScriptedPushClient::new());
    let (coordinator, _store, mut events) = boot(dir.path(), client.clone());
    let outcome = coordinator.start(sender_config("key-A")).await;

    // THEN: No registration, first-session token, history handed to listen
    assert_eq!(
        outcome,
        StartOutcome::Started {
            token: Some(String::from("token-1"))
        }
    );
    assert_eq!(client.register_count(), 0);

    let (request, _) = client.last_listen().unwrap();
    assert_eq!(
        request.persistent_ids,
        vec![PersistentId::from("p1"), PersistentId::from("p2")]
    );
    assert_eq!(
        request.credentials.extra.get("gcm"),
        Some(&json!({"androidId": "android-1"}))
    );
    assert_eq!(
        next_event(&mut events).await,
        ReceiverEvent::ServiceStarted {
            token: Some(String::from("token-1"))
        }
    );
}
