// Unit tests for the sender config and message shapes

use crate::models::{IncomingMessage, PersistentId, SenderConfig};

use serde_json::json;

/// **VALUE**: Verifies that the consumer's start-request JSON deserializes.
///
/// **WHY THIS MATTERS**: Start requests come from the consumer as JSON in the
/// `firebase.apiKey / appID / projectID` shape.
///
/// **BUG THIS CATCHES**: Would catch a renamed field (e.g. `appId` vs `appID`).
#[test]
fn given_consumer_json_when_deserialized_then_sender_config_populated() {
    // GIVEN: Consumer JSON with a vapid key
    let raw = json!({
        "firebase": { "apiKey": "key-A", "appID": "1:2:web:3", "projectID": "proj" },
        "vapidKey": "vapid"
    });

    // WHEN: Deserializing
    let config: SenderConfig = serde_json::from_value(raw).unwrap();

    // THEN: Every field is populated
    assert!(config.api_key().matches("key-A"));
    assert_eq!(config.firebase.app_id, "1:2:web:3");
    assert_eq!(config.firebase.project_id, "proj");
    assert_eq!(config.vapid_key.as_deref(), Some("vapid"));
}

/// **VALUE**: Verifies that the vapid key is optional.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[serde(default)]`.
#[test]
fn given_json_without_vapid_key_when_deserialized_then_vapid_key_is_none() {
    let raw = json!({ "firebase": { "apiKey": "k", "appID": "a", "projectID": "p" } });

    let config: SenderConfig = serde_json::from_value(raw).unwrap();

    assert!(config.vapid_key.is_none());
}

/// **VALUE**: Verifies that a config built in code matches the consumer's JSON shape.
///
/// **BUG THIS CATCHES**: Would catch the builder storing the vapid key or API key
/// somewhere the deserialized config does not.
#[test]
fn given_builder_with_vapid_key_when_compared_to_json_then_fields_agree() {
    // GIVEN: The same sender described in code and as JSON
    let built = SenderConfig::new("key-A", "1:2:web:3", "proj").with_vapid_key("vapid");
    let parsed: SenderConfig = serde_json::from_value(json!({
        "firebase": { "apiKey": "key-A", "appID": "1:2:web:3", "projectID": "proj" },
        "vapidKey": "vapid"
    }))
    .unwrap();

    // THEN: Every field agrees
    assert!(built.api_key().matches(parsed.api_key().as_str()));
    assert_eq!(built.firebase.app_id, parsed.firebase.app_id);
    assert_eq!(built.firebase.project_id, parsed.firebase.project_id);
    assert_eq!(built.vapid_key, parsed.vapid_key);
}

/// **VALUE**: Verifies that incoming messages accept numeric and string ids.
///
/// **BUG THIS CATCHES**: Would catch the untagged id enum being reordered so numbers
/// fail to parse.
#[test]
fn given_transport_message_when_deserialized_then_id_shape_kept() {
    let text: IncomingMessage =
        serde_json::from_value(json!({"notification": {}, "persistentId": "0:x"})).unwrap();
    let number: IncomingMessage =
        serde_json::from_value(json!({"notification": {}, "persistentId": 5})).unwrap();

    assert_eq!(text.persistent_id, PersistentId::from("0:x"));
    assert_eq!(number.persistent_id, PersistentId::from(5_i64));
    assert_eq!(number.persistent_id.to_string(), "5");
}
