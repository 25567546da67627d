// Unit tests for event channel names and payloads

use crate::events::{ChannelTarget, ConsumerTarget, ReceiverEvent};
use crate::models::PersistentId;
use crate::{
    NOTIFICATION_RECEIVED, NOTIFICATION_SERVICE_ERROR, NOTIFICATION_SERVICE_STARTED,
    START_NOTIFICATION_SERVICE, TOKEN_UPDATED,
};

use serde_json::{Value, json};

/// **VALUE**: Pins the wire channel names.
///
/// **WHY THIS MATTERS**: Consumers subscribe by these exact strings. A rename breaks
/// every consumer silently.
///
/// **BUG THIS CATCHES**: Would catch a typo in the prefix or a swapped mapping.
#[test]
fn given_each_event_when_channel_read_then_matches_wire_name() {
    assert_eq!(
        START_NOTIFICATION_SERVICE,
        "PUSH_RECEIVER:::START_NOTIFICATION_SERVICE"
    );
    assert_eq!(
        ReceiverEvent::ServiceStarted { token: None }.channel(),
        NOTIFICATION_SERVICE_STARTED
    );
    assert_eq!(
        ReceiverEvent::ServiceError {
            message: String::new()
        }
        .channel(),
        NOTIFICATION_SERVICE_ERROR
    );
    assert_eq!(
        ReceiverEvent::TokenUpdated { token: None }.channel(),
        TOKEN_UPDATED
    );
    assert_eq!(
        ReceiverEvent::NotificationReceived {
            notification: Value::Null,
            persistent_id: PersistentId::from("p"),
        }
        .channel(),
        NOTIFICATION_RECEIVED
    );
}

/// **VALUE**: Verifies payload shapes, including an absent token.
///
/// **WHY THIS MATTERS**: `service-started` may carry no token; consumers expect `null`,
/// not an empty string.
///
/// **BUG THIS CATCHES**: Would catch `unwrap_or_default()` turning None into "".
#[test]
fn given_events_when_payload_built_then_shapes_match() {
    assert_eq!(
        ReceiverEvent::ServiceStarted { token: None }.payload(),
        Value::Null
    );
    assert_eq!(
        ReceiverEvent::TokenUpdated {
            token: Some("t".into())
        }
        .payload(),
        json!("t")
    );
    assert_eq!(
        ReceiverEvent::ServiceError {
            message: "boom".into()
        }
        .payload(),
        json!("boom")
    );
    assert_eq!(
        ReceiverEvent::NotificationReceived {
            notification: json!({"title": "x"}),
            persistent_id: PersistentId::from("p"),
        }
        .payload(),
        json!({"title": "x"})
    );
}

/// **VALUE**: Verifies that a dropped receiver counts as a destroyed consumer.
///
/// **WHY THIS MATTERS**: When the host tears down its side of the channel, the relay
/// should stop trying to forward.
///
/// **BUG THIS CATCHES**: Would catch `is_destroyed` only honouring the explicit flag.
#[test]
fn given_receiver_dropped_when_checked_then_target_is_destroyed() {
    // GIVEN: A target whose receiver is gone
    let (target, rx) = ChannelTarget::new();
    assert!(!target.is_destroyed());
    drop(rx);

    // WHEN/THEN: The target reports destroyed and sending does not panic
    assert!(target.is_destroyed());
    target.send(ReceiverEvent::ServiceStarted { token: None });
}
