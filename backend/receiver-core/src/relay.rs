//! Hands pushes from the listen client to the consumer.

use crate::client::NotificationSender;
use crate::dedup::DedupTracker;
use crate::error::StoreError;
use crate::events::{ConsumerTarget, ReceiverEvent};
use crate::models::IncomingMessage;

use std::sync::Arc;

use log::{debug, error, info};
use tokio::sync::mpsc;

/// Records each delivered id, then forwards the notification if the
/// consumer is still around.
#[derive(Clone)]
pub struct NotificationRelay {
    dedup: DedupTracker,
    target: Arc<dyn ConsumerTarget>,
}

impl NotificationRelay {
    pub fn new(dedup: DedupTracker, target: Arc<dyn ConsumerTarget>) -> Self {
        Self { dedup, target }
    }

    /// Process one message.
    ///
    /// Returns `Ok(true)` if the consumer received it, `Ok(false)` if the
    /// consumer was destroyed and the event was dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the id could not be recorded. The message is
    /// not forwarded in that case.
    pub fn deliver(&self, message: IncomingMessage) -> Result<bool, StoreError> {
        self.dedup.record(&message.persistent_id)?;

        if self.target.is_destroyed() {
            debug!(
                "Consumer destroyed, dropping notification {}",
                message.persistent_id
            );
            return Ok(false);
        }

        self.target.send(ReceiverEvent::notification(message));
        Ok(true)
    }

    /// Spawn the relay task and return the sender the listen client feeds.
    ///
    /// The task ends once every [`NotificationSender`] clone is dropped.
    pub fn spawn(self) -> NotificationSender {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(relay_task(rx, self));
        NotificationSender::new(tx)
    }
}

async fn relay_task(mut rx: mpsc::UnboundedReceiver<IncomingMessage>, relay: NotificationRelay) {
    debug!("Notification relay started");

    while let Some(message) = rx.recv().await {
        let id = message.persistent_id.clone();
        if let Err(e) = relay.deliver(message) {
            error!("Failed to record delivered id {id}, notification not forwarded: {e}");
        }
    }

    info!("Notification relay stopped, listen client released its sender");
}
