use crate::helpers::{FailingWriteStore, ScriptedPushClient, drain, sender_config};

use receiver_core::store::{MemoryStore, PersistentStateStore};
use receiver_core::{
    ChannelTarget, Credentials, ListenOptions, ReceiverEvent, StartOutcome, StartupCoordinator,
};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

struct Fixture {
    client: Arc<ScriptedPushClient>,
    store: PersistentStateStore,
    coordinator: StartupCoordinator,
    events: UnboundedReceiver<ReceiverEvent>,
}

fn fixture(client: ScriptedPushClient) -> Fixture {
    fixture_with_options(client, ListenOptions::default())
}

fn fixture_with_options(client: ScriptedPushClient, options: ListenOptions) -> Fixture {
    let client = Arc::new(client);
    let store = PersistentStateStore::new(Arc::new(MemoryStore::new()));
    let (target, events) = ChannelTarget::new();
    let coordinator =
        StartupCoordinator::new(client.clone(), store.clone(), Arc::new(target), options);
    Fixture {
        client,
        store,
        coordinator,
        events,
    }
}

fn started(token: &str) -> StartOutcome {
    StartOutcome::Started {
        token: Some(token.to_string()),
    }
}

fn count_started(events: &[ReceiverEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ReceiverEvent::ServiceStarted { .. }))
        .count()
}

fn count_errors(events: &[ReceiverEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ReceiverEvent::ServiceError { .. }))
        .count()
}

// ----------------------------------------------------------------------------
// Single flight
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies that concurrent start requests run registration and listen once.
///
/// **WHY THIS MATTERS**: Consumers fire start requests on every page load. Two
/// overlapping registrations produce two tokens and two live streams, so every push
/// would be delivered twice.
///
/// **BUG THIS CATCHES**: Would catch callers racing past the in-flight check, or
/// waiters re-running the attempt after it finished.
#[tokio::test]
async fn given_concurrent_start_requests_when_attempt_succeeds_then_collaborators_called_once() {
    // GIVEN: A coordinator whose listen call is held open
    let mut fx = fixture(ScriptedPushClient::gated());

    // WHEN: Eight start requests arrive while the first is in flight
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let coordinator = fx.coordinator.clone();
            tokio::spawn(async move { coordinator.start(sender_config("key-A")).await })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(fx.coordinator.is_starting().await, "attempt should be in flight");
    fx.client.open_gate();

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    // THEN: One registration, one listen, same token everywhere
    assert_eq!(fx.client.register_count(), 1);
    assert_eq!(fx.client.listen_count(), 1);
    assert!(outcomes.iter().all(|o| *o == started("token-1")));
    assert!(fx.coordinator.is_started().await);

    // AND: One token update, and one service-started per request
    let events = drain(&mut fx.events);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, ReceiverEvent::TokenUpdated { .. }))
            .count(),
        1
    );
    assert_eq!(count_started(&events), 8);
    assert_eq!(count_errors(&events), 0);
}

/// **VALUE**: Verifies that concurrent callers share a failure instead of retrying.
///
/// **WHY THIS MATTERS**: If every waiter retried after a failure, a burst of N requests
/// against a broken network would hammer the push service N times back to back.
///
/// **BUG THIS CATCHES**: Would catch waiters treating a failed attempt as "idle, go again".
#[tokio::test]
async fn given_concurrent_start_requests_when_attempt_fails_then_all_observe_same_error() {
    // GIVEN: A held-open listen that will fail
    let mut fx = fixture(ScriptedPushClient::gated().fail_next_listen("connection refused"));

    // WHEN: Five start requests overlap
    let handles: Vec<_> = (0..5)
        .map(|_| {
            let coordinator = fx.coordinator.clone();
            tokio::spawn(async move { coordinator.start(sender_config("key-A")).await })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(50)).await;
    fx.client.open_gate();

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    // THEN: Everyone sees the same failure and collaborators ran once
    let expected = StartOutcome::Failed {
        message: String::from("connection refused"),
    };
    assert!(outcomes.iter().all(|o| *o == expected));
    assert_eq!(fx.client.register_count(), 1);
    assert_eq!(fx.client.listen_count(), 1);

    // AND: Exactly one service-error event, no service-started
    let events = drain(&mut fx.events);
    assert_eq!(count_errors(&events), 1);
    assert_eq!(count_started(&events), 0);
    assert!(!fx.coordinator.is_started().await);
}

// ----------------------------------------------------------------------------
// Idempotent restart
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies that starting an already started receiver is a no-op.
///
/// **WHY THIS MATTERS**: Consumers reload and ask again. They need the token back,
/// but must not trigger another registration or a second stream.
///
/// **BUG THIS CATCHES**: Would catch the started flag not being set, or the
/// short-circuit not re-emitting the token.
#[tokio::test]
async fn given_started_receiver_when_start_requested_again_then_only_token_is_reemitted() {
    // GIVEN: A started receiver
    let mut fx = fixture(ScriptedPushClient::new());
    assert_eq!(
        fx.coordinator.start(sender_config("key-A")).await,
        started("token-1")
    );
    drain(&mut fx.events);

    // WHEN: Starting again, even with a different API key
    let outcome = fx.coordinator.start(sender_config("key-B")).await;

    // THEN: Same token, no new collaborator calls
    assert_eq!(outcome, started("token-1"));
    assert_eq!(fx.client.register_count(), 1);
    assert_eq!(fx.client.listen_count(), 1);
    assert_eq!(
        drain(&mut fx.events),
        vec![ReceiverEvent::ServiceStarted {
            token: Some(String::from("token-1"))
        }]
    );
}

// ----------------------------------------------------------------------------
// Credentials
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies that stored credentials for the same API key are reused.
///
/// **WHY THIS MATTERS**: Re-registering on every launch rotates the token and breaks
/// the consumer's server-side subscription.
///
/// **BUG THIS CATCHES**: Would catch comparing against the wrong stored key.
#[tokio::test]
async fn given_stored_credentials_for_same_key_when_started_then_no_registration() {
    // GIVEN: Stored credentials for key A
    let mut fx = fixture(ScriptedPushClient::new());
    let stored = Credentials::with_token("stored-token");
    fx.store.set_credentials(&stored).unwrap();
    fx.store.set_registered_api_key("key-A").unwrap();

    // WHEN: Starting with key A
    let outcome = fx.coordinator.start(sender_config("key-A")).await;

    // THEN: Stored credentials go straight to listen
    assert_eq!(outcome, started("stored-token"));
    assert_eq!(fx.client.register_count(), 0);
    let (request, _) = fx.client.last_listen().unwrap();
    assert_eq!(request.credentials, stored);
    assert_eq!(
        drain(&mut fx.events),
        vec![ReceiverEvent::ServiceStarted {
            token: Some(String::from("stored-token"))
        }]
    );
}

/// **VALUE**: Verifies rotation on API key change and event ordering.
///
/// **WHY THIS MATTERS**: The consumer must learn the new token before it is told the
/// service is up, so it can upload the token before pushes start arriving.
///
/// **BUG THIS CATCHES**: Would catch `token-updated` emitted after `service-started`,
/// or new credentials not persisted.
#[tokio::test]
async fn given_stored_key_a_when_started_with_key_b_then_rotates_and_orders_events() {
    // GIVEN: Stored credentials for key A
    let mut fx = fixture(ScriptedPushClient::new());
    fx.store
        .set_credentials(&Credentials::with_token("old-token"))
        .unwrap();
    fx.store.set_registered_api_key("key-A").unwrap();

    // WHEN: Starting with key B
    let outcome = fx.coordinator.start(sender_config("key-B")).await;

    // THEN: Registered once and persisted
    assert_eq!(outcome, started("token-1"));
    assert_eq!(fx.client.register_count(), 1);
    assert_eq!(
        fx.store.registered_api_key().unwrap().as_deref(),
        Some("key-B")
    );
    assert_eq!(
        fx.store.credentials().unwrap().unwrap().token(),
        Some("token-1")
    );

    // AND: token-updated precedes service-started
    assert_eq!(
        drain(&mut fx.events),
        vec![
            ReceiverEvent::TokenUpdated {
                token: Some(String::from("token-1"))
            },
            ReceiverEvent::ServiceStarted {
                token: Some(String::from("token-1"))
            },
        ]
    );
}

/// **VALUE**: Verifies that socket options reach the listen client untouched.
///
/// **BUG THIS CATCHES**: Would catch options being dropped or defaulted on the way.
#[tokio::test]
async fn given_listen_options_when_started_then_forwarded_to_listen() {
    // GIVEN: Explicit socket options
    let options = ListenOptions {
        socket_timeout: Some(Duration::from_secs(30)),
        socket_keep_alive_delay: Some(Duration::from_secs(60)),
    };
    let fx = fixture_with_options(ScriptedPushClient::new(), options);

    // WHEN: Starting
    fx.coordinator.start(sender_config("key-A")).await;

    // THEN: Listen saw the same options
    let (_, seen) = fx.client.last_listen().unwrap();
    assert_eq!(seen, options);
}

// ----------------------------------------------------------------------------
// Failure recovery
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies that a failed registration does not block later starts.
///
/// **WHY THIS MATTERS**: A transient network error at launch must not leave the
/// receiver permanently dead until the app restarts.
///
/// **BUG THIS CATCHES**: Would catch the in-flight handle never being cleared after
/// a failure.
#[tokio::test]
async fn given_failed_registration_when_started_again_then_retries_from_scratch() {
    // GIVEN: A client whose first registration fails
    let mut fx = fixture(ScriptedPushClient::new().fail_next_register("network down"));

    // WHEN: Starting twice
    let first = fx.coordinator.start(sender_config("key-A")).await;
    let second = fx.coordinator.start(sender_config("key-A")).await;

    // THEN: First failed, second registered again and started
    assert_eq!(
        first,
        StartOutcome::Failed {
            message: String::from("network down")
        }
    );
    assert_eq!(second, started("token-2"));
    assert_eq!(fx.client.register_count(), 2);
    assert_eq!(fx.client.listen_count(), 1);

    let events = drain(&mut fx.events);
    assert_eq!(
        events[0],
        ReceiverEvent::ServiceError {
            message: String::from("network down")
        }
    );
    assert_eq!(count_started(&events), 1);
}

/// **VALUE**: Verifies that credentials persisted before a listen failure are reused.
///
/// **WHY THIS MATTERS**: Registration succeeded, so the retry should only redo listen.
///
/// **BUG THIS CATCHES**: Would catch credentials only being persisted after listen.
#[tokio::test]
async fn given_failed_listen_when_started_again_then_reuses_registration() {
    // GIVEN: A client whose first listen fails
    let fx = fixture(ScriptedPushClient::new().fail_next_listen("bad credentials"));

    // WHEN: Starting twice
    let first = fx.coordinator.start(sender_config("key-A")).await;
    let second = fx.coordinator.start(sender_config("key-A")).await;

    // THEN: One registration, two listens
    assert!(matches!(first, StartOutcome::Failed { .. }));
    assert_eq!(second, started("token-1"));
    assert_eq!(fx.client.register_count(), 1);
    assert_eq!(fx.client.listen_count(), 2);
}

/// **VALUE**: Verifies that a credential write failure aborts the start cleanly.
///
/// **WHY THIS MATTERS**: A token that was never saved cannot be reused on the next
/// launch, so announcing it or starting the listener would leave the app with a
/// registration that silently disappears on restart.
///
/// **BUG THIS CATCHES**: Would catch `token-updated` being sent before the write is
/// confirmed, or the coordinator staying in `Starting` after a store error.
#[tokio::test]
async fn given_store_write_failure_when_started_then_reports_error_and_recovers() {
    // GIVEN: A store that rejects writes
    let client = Arc::new(ScriptedPushClient::new());
    let backend = Arc::new(FailingWriteStore::failing());
    let (target, mut events) = ChannelTarget::new();
    let coordinator = StartupCoordinator::new(
        client.clone(),
        PersistentStateStore::new(backend.clone()),
        Arc::new(target),
        ListenOptions::default(),
    );

    // WHEN: Starting
    let first = coordinator.start(sender_config("key-A")).await;

    // THEN: Registration ran, but nothing was announced or started
    let expected = format!(
        "Failed to write {}: read-only file system",
        FailingWriteStore::FAILURE_PATH
    );
    assert_eq!(
        first,
        StartOutcome::Failed {
            message: expected.clone()
        }
    );
    assert_eq!(client.register_count(), 1);
    assert_eq!(client.listen_count(), 0);
    assert!(!coordinator.is_started().await);
    assert!(!coordinator.is_starting().await);

    let failed_events = drain(&mut events);
    assert_eq!(
        failed_events,
        vec![ReceiverEvent::ServiceError { message: expected }]
    );

    // WHEN: The store recovers and the start is requested again
    backend.set_failing(false);
    let second = coordinator.start(sender_config("key-A")).await;

    // THEN: The retry registers from scratch and starts
    assert_eq!(second, started("token-2"));
    assert_eq!(client.register_count(), 2);
    assert_eq!(client.listen_count(), 1);
    assert!(coordinator.is_started().await);

    let events = drain(&mut events);
    assert_eq!(
        events,
        vec![
            ReceiverEvent::TokenUpdated {
                token: Some(String::from("token-2"))
            },
            ReceiverEvent::ServiceStarted {
                token: Some(String::from("token-2"))
            },
        ]
    );
}
