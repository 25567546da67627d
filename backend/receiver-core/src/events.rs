//! Events pushed to the consumer side of the host.

use crate::models::{IncomingMessage, PersistentId};
use crate::{
    NOTIFICATION_RECEIVED, NOTIFICATION_SERVICE_ERROR, NOTIFICATION_SERVICE_STARTED,
    TOKEN_UPDATED,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use serde_json::Value;
use tokio::sync::mpsc;

/// Lifecycle and delivery events, one per outbound channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ReceiverEvent {
    /// Listening (or already listening). Carries the current FCM token.
    ServiceStarted { token: Option<String> },

    /// A start attempt failed.
    ServiceError { message: String },

    /// Registration produced new credentials.
    TokenUpdated { token: Option<String> },

    /// A push was delivered.
    NotificationReceived {
        notification: Value,
        persistent_id: PersistentId,
    },
}

impl ReceiverEvent {
    /// Channel name the host forwards this event on.
    pub fn channel(&self) -> &'static str {
        match self {
            ReceiverEvent::ServiceStarted { .. } => NOTIFICATION_SERVICE_STARTED,
            ReceiverEvent::ServiceError { .. } => NOTIFICATION_SERVICE_ERROR,
            ReceiverEvent::TokenUpdated { .. } => TOKEN_UPDATED,
            ReceiverEvent::NotificationReceived { .. } => NOTIFICATION_RECEIVED,
        }
    }

    /// JSON payload sent alongside the channel name.
    pub fn payload(&self) -> Value {
        match self {
            ReceiverEvent::ServiceStarted { token } | ReceiverEvent::TokenUpdated { token } => {
                token.clone().map(Value::String).unwrap_or(Value::Null)
            }
            ReceiverEvent::ServiceError { message } => Value::String(message.clone()),
            ReceiverEvent::NotificationReceived { notification, .. } => notification.clone(),
        }
    }

    pub(crate) fn notification(message: IncomingMessage) -> Self {
        ReceiverEvent::NotificationReceived {
            notification: message.notification,
            persistent_id: message.persistent_id,
        }
    }
}

/// The consumer the receiver reports to (a window, a renderer, a socket).
pub trait ConsumerTarget: Send + Sync {
    fn send(&self, event: ReceiverEvent);

    /// True once the consumer is gone and events should be dropped.
    fn is_destroyed(&self) -> bool;
}

/// [`ConsumerTarget`] backed by an unbounded tokio channel.
///
/// The host drains the receiver half and forwards events over its own
/// transport. Calling [`ChannelTarget::destroy`] marks the consumer as gone.
#[derive(Clone)]
pub struct ChannelTarget {
    tx: mpsc::UnboundedSender<ReceiverEvent>,
    destroyed: Arc<AtomicBool>,
}

impl ChannelTarget {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReceiverEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let target = Self {
            tx,
            destroyed: Arc::new(AtomicBool::new(false)),
        };
        (target, rx)
    }

    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }
}

impl ConsumerTarget for ChannelTarget {
    fn send(&self, event: ReceiverEvent) {
        let channel = event.channel();
        if self.tx.send(event).is_err() {
            debug!("Consumer channel closed, dropped event on {channel}");
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst) || self.tx.is_closed()
    }
}
