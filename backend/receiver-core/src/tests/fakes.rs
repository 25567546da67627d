// Test doubles shared by the unit tests

use crate::client::{NotificationSender, PushClient};
use crate::error::{ListenError, RegistrationError};
use crate::events::ReceiverEvent;
use crate::models::{Credentials, ListenOptions, ListenRequest, SenderConfig};

use common::ErrorLocation;

use std::collections::VecDeque;
use std::panic::Location;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Push client that hands out `token-<n>` credentials and counts registrations.
/// Listening always succeeds immediately.
#[derive(Default)]
pub struct FakePushClient {
    pub register_calls: AtomicUsize,
    pub register_failures: Mutex<VecDeque<String>>,
}

impl FakePushClient {
    pub fn failing_register(message: &str) -> Self {
        let client = Self::default();
        client
            .register_failures
            .lock()
            .unwrap()
            .push_back(message.to_string());
        client
    }

    pub fn register_count(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushClient for FakePushClient {
    async fn register(&self, _config: &SenderConfig) -> Result<Credentials, RegistrationError> {
        let n = self.register_calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(message) = self.register_failures.lock().unwrap().pop_front() {
            return Err(RegistrationError::Rejected {
                message,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(Credentials::with_token(format!("token-{n}")))
    }

    async fn listen(
        &self,
        _request: ListenRequest,
        _sender: NotificationSender,
        _options: ListenOptions,
    ) -> Result<(), ListenError> {
        Ok(())
    }
}

/// Pull every event currently queued on the consumer channel.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ReceiverEvent>) -> Vec<ReceiverEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
