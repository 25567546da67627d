pub mod client;
pub mod coordinator;
pub mod dedup;
pub mod error;
pub mod events;
pub mod logger;
pub mod models;
pub mod registration;
pub mod relay;
pub mod service;
pub mod settings;
pub mod store;

#[cfg(test)]
mod tests;

pub use client::{NotificationSender, PushClient};
pub use coordinator::{StartOutcome, StartupCoordinator};
pub use events::{ChannelTarget, ConsumerTarget, ReceiverEvent};
pub use models::{Credentials, IncomingMessage, ListenOptions, PersistentId, SenderConfig};
pub use service::{PushReceiverHandle, start_push_receiver};

/// Prefix shared by every event channel and by start-failure log lines.
pub const CHANNEL_PREFIX: &str = "PUSH_RECEIVER:::";

pub const START_NOTIFICATION_SERVICE: &str =
    const_format::concatcp!(CHANNEL_PREFIX, "START_NOTIFICATION_SERVICE");
pub const NOTIFICATION_SERVICE_STARTED: &str =
    const_format::concatcp!(CHANNEL_PREFIX, "NOTIFICATION_SERVICE_STARTED");
pub const NOTIFICATION_SERVICE_ERROR: &str =
    const_format::concatcp!(CHANNEL_PREFIX, "NOTIFICATION_SERVICE_ERROR");
pub const NOTIFICATION_RECEIVED: &str =
    const_format::concatcp!(CHANNEL_PREFIX, "NOTIFICATION_RECEIVED");
pub const TOKEN_UPDATED: &str = const_format::concatcp!(CHANNEL_PREFIX, "TOKEN_UPDATED");
