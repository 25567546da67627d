use crate::error::StoreError;
use crate::models::{Credentials, PersistentId};
use crate::store::KeyValueStore;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub const CREDENTIALS_KEY: &str = "credentials";
pub const FCM_API_KEY_KEY: &str = "fcmApiKey";
pub const PERSISTENT_IDS_KEY: &str = "persistentIds";

/// Everything a start attempt reads before deciding what to do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredState {
    pub credentials: Option<Credentials>,
    pub api_key: Option<String>,
    pub delivered_ids: Vec<PersistentId>,
}

/// Typed accessor over a [`KeyValueStore`].
///
/// Cheap to clone; all clones share the same backend.
#[derive(Clone)]
pub struct PersistentStateStore {
    backend: Arc<dyn KeyValueStore>,
}

impl PersistentStateStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn credentials(&self) -> Result<Option<Credentials>, StoreError> {
        self.read(CREDENTIALS_KEY)
    }

    pub fn set_credentials(&self, credentials: &Credentials) -> Result<(), StoreError> {
        self.write(CREDENTIALS_KEY, credentials)
    }

    /// API key the stored credentials were registered with.
    pub fn registered_api_key(&self) -> Result<Option<String>, StoreError> {
        self.read(FCM_API_KEY_KEY)
    }

    pub fn set_registered_api_key(&self, api_key: &str) -> Result<(), StoreError> {
        self.write(FCM_API_KEY_KEY, api_key)
    }

    /// Delivered-id history, oldest first. Absent reads as empty.
    pub fn delivered_ids(&self) -> Result<Vec<PersistentId>, StoreError> {
        Ok(self.read(PERSISTENT_IDS_KEY)?.unwrap_or_default())
    }

    pub fn set_delivered_ids(&self, ids: &[PersistentId]) -> Result<(), StoreError> {
        self.write(PERSISTENT_IDS_KEY, ids)
    }

    pub fn snapshot(&self) -> Result<StoredState, StoreError> {
        Ok(StoredState {
            credentials: self.credentials()?,
            api_key: self.registered_api_key()?,
            delivered_ids: self.delivered_ids()?,
        })
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.backend.get(key)? {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::Decode {
                    location: ErrorLocation::from(Location::caller()),
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|e| StoreError::Serialize {
            location: ErrorLocation::from(Location::caller()),
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.backend.set(key, value)
    }
}
