// Unit tests for the store backends and the typed state accessor

use crate::dedup::DedupTracker;
use crate::error::StoreError;
use crate::models::{Credentials, PersistentId};
use crate::store::{
    FCM_API_KEY_KEY, JsonFileStore, KeyValueStore, MemoryStore, PersistentStateStore,
    STORE_FILE_NAME,
};

use std::sync::Arc;

use serde_json::{Number, json};

/// **VALUE**: Verifies that a JSON file store survives being reopened.
///
/// **WHY THIS MATTERS**: Credentials and delivered ids exist to survive restarts.
/// If a reopened store comes back empty, every restart re-registers and replays history.
///
/// **BUG THIS CATCHES**: Would catch writes that only reach memory, or a load path
/// that ignores an existing file.
#[test]
fn given_written_key_when_store_reopened_then_value_is_read_back() {
    // GIVEN: A store in a fresh directory with one key written
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::open(dir.path()).unwrap();
    assert_eq!(store.path(), dir.path().join(STORE_FILE_NAME));
    store.set(FCM_API_KEY_KEY, json!("key-A")).unwrap();
    drop(store);

    // WHEN: Reopening the same directory
    let reopened = JsonFileStore::open(dir.path()).unwrap();

    // THEN: The value is there
    assert_eq!(reopened.get(FCM_API_KEY_KEY).unwrap(), Some(json!("key-A")));
    assert!(!dir.path().join(format!("{STORE_FILE_NAME}.tmp")).exists());
}

/// **VALUE**: Verifies that a corrupted store file is reported, not silently reset.
///
/// **WHY THIS MATTERS**: Treating a corrupt file as empty would discard delivered-id
/// history and redeliver every notification on the next start.
///
/// **BUG THIS CATCHES**: Would catch a load path that falls back to defaults on parse errors.
#[test]
fn given_corrupt_file_when_opened_then_returns_parse_error() {
    // GIVEN: A store file that is not JSON
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(STORE_FILE_NAME), "{not json").unwrap();

    // WHEN: Opening it
    let result = JsonFileStore::open(dir.path());

    // THEN: A parse error comes back
    assert!(matches!(result, Err(StoreError::Parse { .. })));
}

/// **VALUE**: Verifies that a missing file opens as an empty store and is created on write.
///
/// **WHY THIS MATTERS**: First launch has no store file.
///
/// **BUG THIS CATCHES**: Would catch `open` failing on first run.
#[test]
fn given_missing_directory_when_written_then_file_is_created() {
    // GIVEN: A directory that does not exist yet
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("nested");
    let store = JsonFileStore::open(&nested).unwrap();
    assert_eq!(store.get("anything").unwrap(), None);

    // WHEN: Writing a key
    store.set("anything", json!(1)).unwrap();

    // THEN: The file exists on disk
    assert!(nested.join(STORE_FILE_NAME).exists());
}

/// **VALUE**: Verifies that opaque credential fields round-trip through the typed accessor.
///
/// **WHY THIS MATTERS**: The push client needs every field it produced at registration
/// time, not just the FCM token, to resume listening after a restart.
///
/// **BUG THIS CATCHES**: Would catch dropping the flattened extra fields.
#[test]
fn given_credentials_with_opaque_fields_when_stored_then_round_trip_intact() {
    // GIVEN: Credentials with extra collaborator fields
    let store = PersistentStateStore::new(Arc::new(MemoryStore::new()));
    let credentials: Credentials = serde_json::from_value(json!({
        "fcm": { "token": "tok", "pushSet": "ps" },
        "gcm": { "androidId": "123", "securityToken": "456" },
        "keys": { "authSecret": "s" }
    }))
    .unwrap();

    // WHEN: Writing and reading back
    store.set_credentials(&credentials).unwrap();
    let read = store.credentials().unwrap();

    // THEN: Everything is preserved
    assert_eq!(read.as_ref(), Some(&credentials));
    assert_eq!(read.unwrap().token(), Some("tok"));
}

/// **VALUE**: Verifies the defaults of an empty store.
///
/// **WHY THIS MATTERS**: A first start must see "no credentials" and an empty history,
/// not an error.
///
/// **BUG THIS CATCHES**: Would catch absent `persistentIds` surfacing as a decode error.
#[test]
fn given_empty_store_when_snapshot_taken_then_everything_is_absent() {
    // GIVEN: An empty store
    let store = PersistentStateStore::new(Arc::new(MemoryStore::new()));

    // WHEN: Taking a snapshot
    let snapshot = store.snapshot().unwrap();

    // THEN: Nothing is set
    assert!(snapshot.credentials.is_none());
    assert!(snapshot.api_key.is_none());
    assert!(snapshot.delivered_ids.is_empty());
}

/// **VALUE**: Verifies that mixed string and numeric ids decode in order.
///
/// **WHY THIS MATTERS**: Different transports have produced both id shapes.
///
/// **BUG THIS CATCHES**: Would catch an id type that only accepts strings.
#[test]
fn given_mixed_ids_when_read_then_order_and_shape_preserved() {
    // GIVEN: A backend holding mixed ids
    let backend = Arc::new(MemoryStore::new());
    backend
        .set("persistentIds", json!(["0:abc", 42, "0:def"]))
        .unwrap();
    let store = PersistentStateStore::new(backend);

    // WHEN: Reading delivered ids
    let ids = store.delivered_ids().unwrap();

    // THEN: Both shapes come back in order
    assert_eq!(
        ids,
        vec![
            PersistentId::from("0:abc"),
            PersistentId::from(42_i64),
            PersistentId::from("0:def"),
        ]
    );
}

/// **VALUE**: Verifies that float and beyond-`i64` ids decode and survive an append.
///
/// **WHY THIS MATTERS**: Hosts written in JavaScript store every number as a double.
/// One history entry that fails to decode would fail every start attempt and every
/// later append, leaving the receiver dead until the store is wiped by hand.
///
/// **BUG THIS CATCHES**: Would catch numeric ids narrowed back to a fixed-width integer.
#[test]
fn given_float_and_large_numeric_ids_when_read_and_appended_then_kept_exactly() {
    // GIVEN: A history holding a string, a float and u64::MAX
    let backend = Arc::new(MemoryStore::new());
    backend
        .set(
            "persistentIds",
            json!(["p1", 1.5, 18446744073709551615_u64]),
        )
        .unwrap();
    let store = PersistentStateStore::new(backend.clone());
    let tracker = DedupTracker::new(store.clone());

    // WHEN: Reading the history and appending another id
    let ids = store.delivered_ids().unwrap();
    tracker.record(&PersistentId::from("p2")).unwrap();

    // THEN: Every entry decoded with its original value
    assert_eq!(
        ids,
        vec![
            PersistentId::from("p1"),
            PersistentId::from(Number::from_f64(1.5).unwrap()),
            PersistentId::from(Number::from(u64::MAX)),
        ]
    );

    // AND: The rewritten history is the old one plus the new id, unchanged
    assert_eq!(
        backend.get("persistentIds").unwrap(),
        Some(json!(["p1", 1.5, 18446744073709551615_u64, "p2"]))
    );
}
