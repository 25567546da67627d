//! Durable key-value storage and the typed view the receiver uses over it.
//!
//! # Backends
//!
//! - [`JsonFileStore`]: one JSON document on disk, rewritten atomically on every `set`
//! - [`MemoryStore`]: process-local map for tests and throwaway hosts
//!
//! Both are wrapped by [`PersistentStateStore`], which knows the three
//! records the receiver persists: credentials, the API key they were
//! registered with, and the delivered-id history.

mod json_file;
mod memory;
mod state;

pub use json_file::{JsonFileStore, STORE_FILE_NAME, default_store_dir};
pub use memory::MemoryStore;
pub use state::{CREDENTIALS_KEY, FCM_API_KEY_KEY, PERSISTENT_IDS_KEY, PersistentStateStore, StoredState};

use crate::error::StoreError;

use serde_json::Value;

/// Single-key durable storage. No transactions beyond one read or one write.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}
