use crate::error::StoreError;
use crate::store::KeyValueStore;

use common::ErrorLocation;

use std::collections::HashMap;
use std::panic::Location;
use std::sync::Mutex;

use serde_json::Value;

/// In-memory [`KeyValueStore`]. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.lock().map_err(|e| StoreError::Poisoned {
            message: format!("Memory store lock poisoned: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|e| StoreError::Poisoned {
            message: format!("Memory store lock poisoned: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}
