//! Delivered-id bookkeeping.
//!
//! Every message the relay hands to the consumer is recorded here before the
//! consumer sees it. The history is given back to the listen client on the
//! next start so the stream does not replay messages already delivered.

use crate::error::StoreError;
use crate::models::PersistentId;
use crate::store::PersistentStateStore;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::{Arc, Mutex};

use log::trace;

/// Append-only view over the persisted `persistentIds` sequence.
///
/// Appends are read-modify-write against the store. The internal lock keeps
/// two appends from this process from losing each other's id.
#[derive(Clone)]
pub struct DedupTracker {
    store: PersistentStateStore,
    append_lock: Arc<Mutex<()>>,
}

impl DedupTracker {
    pub fn new(store: PersistentStateStore) -> Self {
        Self {
            store,
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Ids already delivered, oldest first.
    pub fn history(&self) -> Result<Vec<PersistentId>, StoreError> {
        self.store.delivered_ids()
    }

    /// Append `id` to the persisted history.
    ///
    /// Membership is not checked: an id delivered twice is recorded twice.
    pub fn record(&self, id: &PersistentId) -> Result<(), StoreError> {
        let _guard = self.append_lock.lock().map_err(|e| StoreError::Poisoned {
            message: format!("Delivered-id lock poisoned: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let mut ids = self.store.delivered_ids()?;
        ids.push(id.clone());
        self.store.set_delivered_ids(&ids)?;

        trace!("Recorded delivered id {id} ({} total)", ids.len());
        Ok(())
    }
}
