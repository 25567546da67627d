//! Receiver settings loaded from `{config_dir}/receiver.json`.
//!
//! ```json
//! {
//!   "version": 1,
//!   "socket_timeout": "30s",
//!   "socket_keep_alive_delay": "15m",
//!   "store_dir": "/var/lib/app/push"
//! }
//! ```
//!
//! Durations use humantime syntax. Every field is optional.

use crate::error::SettingsError;
use crate::models::ListenOptions;
use crate::store::default_store_dir;

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

const SETTINGS_FILE_NAME: &str = "receiver.json";
const SETTINGS_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiverSettings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(
        default,
        with = "humantime_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub socket_timeout: Option<Duration>,

    #[serde(
        default,
        with = "humantime_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub socket_keep_alive_delay: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,
}

impl Default for ReceiverSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            socket_timeout: None,
            socket_keep_alive_delay: None,
            store_dir: None,
        }
    }
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl ReceiverSettings {
    /// Load settings from {config_dir}/receiver.json.
    ///
    /// # Returns
    ///
    /// Returns defaults if the file is missing.
    /// Returns `Err(SettingsError)` if the file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, SettingsError> {
        let settings_path = config_dir.join(SETTINGS_FILE_NAME);

        if !settings_path.exists() {
            info!(
                "Settings file not found at {}, using defaults",
                settings_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
            warn!("Failed to read settings file: {}", e);
            SettingsError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: settings_path.clone(),
                source: e,
            }
        })?;

        let settings: ReceiverSettings = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse settings JSON: {}", e);
            SettingsError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: settings_path.clone(),
                reason: e.to_string(),
            }
        })?;

        settings.validate()?;

        info!("Settings loaded from {}", settings_path.display());
        Ok(settings)
    }

    /// Save settings to {config_dir}/receiver.json using temp file + rename.
    pub fn save(&self, config_dir: &Path) -> Result<(), SettingsError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| SettingsError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let settings_path = config_dir.join(SETTINGS_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", SETTINGS_FILE_NAME));

        let json =
            serde_json::to_string_pretty(self).map_err(|e| SettingsError::SerializeError {
                location: ErrorLocation::from(Location::caller()),
                reason: e.to_string(),
            })?;

        std::fs::write(&temp_path, json).map_err(|e| SettingsError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &settings_path).map_err(|e| SettingsError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: settings_path.clone(),
            source: e,
        })?;

        info!("Settings saved to {}", settings_path.display());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`SettingsError::ValidationError`] for an unknown version or a
    /// zero duration.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.version == 0 || self.version > SETTINGS_VERSION {
            return Err(SettingsError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, SETTINGS_VERSION
                ),
            });
        }

        for (name, value) in [
            ("socket_timeout", self.socket_timeout),
            ("socket_keep_alive_delay", self.socket_keep_alive_delay),
        ] {
            if value.is_some_and(|d| d.is_zero()) {
                return Err(SettingsError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("{name} must be greater than zero"),
                });
            }
        }

        Ok(())
    }

    pub fn listen_options(&self) -> ListenOptions {
        ListenOptions {
            socket_timeout: self.socket_timeout,
            socket_keep_alive_delay: self.socket_keep_alive_delay,
        }
    }

    /// Configured store directory, else the platform default.
    pub fn resolved_store_dir(&self) -> Option<PathBuf> {
        self.store_dir.clone().or_else(default_store_dir)
    }
}

mod humantime_option {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(duration) => serializer.collect_str(&humantime::format_duration(*duration)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| humantime::parse_duration(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
