//! Data carried between the host, the coordinator and the push client.
//!
//! Only the pieces the coordinator reasons about are typed. Everything the
//! registration client produces beyond the FCM token is kept as opaque JSON so
//! it survives a round trip through the store untouched.

use common::RedactedApiKey;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

// ============================================
// SENDER CONFIG
// ============================================

/// Firebase project the receiver registers against.
#[derive(Debug, Clone, Deserialize)]
pub struct FirebaseConfig {
    #[serde(rename = "apiKey")]
    pub api_key: RedactedApiKey,
    #[serde(rename = "appID")]
    pub app_id: String,
    #[serde(rename = "projectID")]
    pub project_id: String,
}

/// Sender configuration supplied with every start request.
///
/// Deserializes from the consumer's shape:
/// `{ "firebase": { "apiKey", "appID", "projectID" }, "vapidKey"? }`.
#[derive(Debug, Clone, Deserialize)]
pub struct SenderConfig {
    pub firebase: FirebaseConfig,
    #[serde(rename = "vapidKey", default)]
    pub vapid_key: Option<String>,
}

impl SenderConfig {
    pub fn new(
        api_key: impl Into<String>,
        app_id: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            firebase: FirebaseConfig {
                api_key: RedactedApiKey::new(api_key),
                app_id: app_id.into(),
                project_id: project_id.into(),
            },
            vapid_key: None,
        }
    }

    pub fn with_vapid_key(mut self, vapid_key: impl Into<String>) -> Self {
        self.vapid_key = Some(vapid_key.into());
        self
    }

    pub fn api_key(&self) -> &RedactedApiKey {
        &self.firebase.api_key
    }
}

// ============================================
// CREDENTIALS
// ============================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FcmCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Credentials produced by registration and persisted under `credentials`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub fcm: FcmCredentials,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Credentials {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            fcm: FcmCredentials {
                token: Some(token.into()),
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    /// The FCM token, if registration produced one.
    pub fn token(&self) -> Option<&str> {
        self.fcm.token.as_deref()
    }
}

// ============================================
// DELIVERY
// ============================================

/// Identifier the push transport attaches to every message.
///
/// Transports have used both numeric and string ids, so both are accepted.
/// Numbers keep their JSON form, so floats and ids above `i64::MAX` read back
/// exactly as they were written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PersistentId {
    Number(Number),
    Text(String),
}

impl Display for PersistentId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        match self {
            PersistentId::Number(n) => write!(formatter, "{n}"),
            PersistentId::Text(s) => write!(formatter, "{s}"),
        }
    }
}

impl From<&str> for PersistentId {
    fn from(value: &str) -> Self {
        PersistentId::Text(value.to_string())
    }
}

impl From<String> for PersistentId {
    fn from(value: String) -> Self {
        PersistentId::Text(value)
    }
}

impl From<i64> for PersistentId {
    fn from(value: i64) -> Self {
        PersistentId::Number(Number::from(value))
    }
}

impl From<Number> for PersistentId {
    fn from(value: Number) -> Self {
        PersistentId::Number(value)
    }
}

/// One decoded push handed over by the listen client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub notification: Value,
    #[serde(rename = "persistentId")]
    pub persistent_id: PersistentId,
}

impl IncomingMessage {
    pub fn new(notification: Value, persistent_id: impl Into<PersistentId>) -> Self {
        Self {
            notification,
            persistent_id: persistent_id.into(),
        }
    }
}

// ============================================
// LISTEN
// ============================================

/// Socket tuning forwarded untouched to the listen client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenOptions {
    pub socket_timeout: Option<Duration>,
    pub socket_keep_alive_delay: Option<Duration>,
}

/// Credentials plus delivered-id history, so the stream resumes after
/// the last message the consumer already saw.
#[derive(Debug, Clone, PartialEq)]
pub struct ListenRequest {
    pub credentials: Credentials,
    pub persistent_ids: Vec<PersistentId>,
}
