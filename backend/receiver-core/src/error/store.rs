use common::ErrorLocation;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store Read Error: {path}: {source} {location}")]
    Read {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store Parse Error: {path}: {reason} {location}")]
    Parse {
        location: ErrorLocation,
        path: PathBuf,
        reason: String,
    },

    #[error("Store Write Error: {path}: {source} {location}")]
    Write {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store Serialization Error: {key}: {reason} {location}")]
    Serialize {
        location: ErrorLocation,
        key: String,
        reason: String,
    },

    #[error("Store Decode Error: {key}: {reason} {location}")]
    Decode {
        location: ErrorLocation,
        key: String,
        reason: String,
    },

    #[error("Store Lock Error: {message} {location}")]
    Poisoned {
        message: String,
        location: ErrorLocation,
    },
}

impl StoreError {
    /// Human readable reason without the call-site suffix.
    pub fn message(&self) -> String {
        match self {
            StoreError::Read { path, source, .. } => {
                format!("Failed to read {}: {source}", path.display())
            }
            StoreError::Parse { path, reason, .. } => {
                format!("Failed to parse {}: {reason}", path.display())
            }
            StoreError::Write { path, source, .. } => {
                format!("Failed to write {}: {source}", path.display())
            }
            StoreError::Serialize { key, reason, .. } => {
                format!("Failed to serialize '{key}': {reason}")
            }
            StoreError::Decode { key, reason, .. } => {
                format!("Failed to decode '{key}': {reason}")
            }
            StoreError::Poisoned { message, .. } => message.clone(),
        }
    }
}
