//! Seam to the push client that performs registration and streaming.
//!
//! The receiver never speaks the push protocol itself. A host plugs in a
//! [`PushClient`] implementation and the coordinator drives it.

use crate::error::{ListenError, RegistrationError};
use crate::models::{Credentials, IncomingMessage, ListenOptions, ListenRequest, SenderConfig};

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Registration and listen collaborator.
#[async_trait]
pub trait PushClient: Send + Sync {
    /// Register this installation with the sender and return fresh credentials.
    async fn register(&self, config: &SenderConfig) -> Result<Credentials, RegistrationError>;

    /// Open the notification stream.
    ///
    /// Must return once the connection is established. The client keeps
    /// `sender` for the life of the stream and pushes every decoded message
    /// through it.
    async fn listen(
        &self,
        request: ListenRequest,
        sender: NotificationSender,
        options: ListenOptions,
    ) -> Result<(), ListenError>;
}

/// Handle the listen client uses to hand messages to the relay.
#[derive(Debug, Clone)]
pub struct NotificationSender {
    tx: mpsc::UnboundedSender<IncomingMessage>,
}

impl NotificationSender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<IncomingMessage>) -> Self {
        Self { tx }
    }

    /// Forward one message. Returns false once the relay has stopped.
    pub fn deliver(&self, message: IncomingMessage) -> bool {
        self.tx.send(message).is_ok()
    }
}
