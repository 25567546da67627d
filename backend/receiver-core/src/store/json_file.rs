use crate::error::StoreError;
use crate::store::KeyValueStore;

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, info};
use serde_json::{Map, Value};

pub const STORE_FILE_NAME: &str = "push-receiver.json";

const STORE_DIR_NAME: &str = "push-receiver";

/// Platform config directory for the store, e.g. `~/.config/push-receiver`.
pub fn default_store_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(STORE_DIR_NAME))
}

/// [`KeyValueStore`] persisted as a single JSON object.
///
/// The whole document is loaded on open and rewritten on every `set` using
/// temp file + rename, so a crash never leaves a half-written file behind.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open (or lazily create) `{dir}/push-receiver.json`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] or [`StoreError::Parse`] if the file exists
    /// but cannot be read or is not a JSON object. A missing file is an empty store.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        let path = dir.join(STORE_FILE_NAME);

        if !path.exists() {
            info!("Store file not found at {}, starting empty", path.display());
            return Ok(Self {
                path,
                entries: Mutex::new(Map::new()),
            });
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| StoreError::Read {
            location: ErrorLocation::from(Location::caller()),
            path: path.clone(),
            source: e,
        })?;

        let entries = match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(StoreError::Parse {
                    location: ErrorLocation::from(Location::caller()),
                    path,
                    reason: format!("expected a JSON object, found {other}"),
                });
            }
            Err(e) => {
                return Err(StoreError::Parse {
                    location: ErrorLocation::from(Location::caller()),
                    path,
                    reason: e.to_string(),
                });
            }
        };

        info!("Store loaded from {} ({} keys)", path.display(), entries.len());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| StoreError::Write {
                location: ErrorLocation::from(Location::caller()),
                path: dir.to_path_buf(),
                source: e,
            })?;
        }

        let temp_path = self.path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(entries).map_err(|e| StoreError::Serialize {
            location: ErrorLocation::from(Location::caller()),
            key: String::from("*"),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| StoreError::Write {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        // Atomic rename (POSIX guarantees atomicity)
        std::fs::rename(&temp_path, &self.path).map_err(|e| StoreError::Write {
            location: ErrorLocation::from(Location::caller()),
            path: self.path.clone(),
            source: e,
        })?;

        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.lock().map_err(|e| StoreError::Poisoned {
            message: format!("Store lock poisoned: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|e| StoreError::Poisoned {
            message: format!("Store lock poisoned: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        // Disk first, memory only once the write landed
        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        self.persist(&next)?;
        *entries = next;

        debug!("Store key '{key}' written to {}", self.path.display());
        Ok(())
    }
}
