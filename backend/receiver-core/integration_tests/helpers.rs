//! Test helpers for receiver integration tests.
//!
//! - A scriptable [`PushClient`] that counts calls and can hold `listen` open
//! - A store whose writes can be switched to fail
//! - Event collection with timeouts

use receiver_core::error::{ListenError, RegistrationError, StoreError};
use receiver_core::models::{ListenOptions, ListenRequest};
use receiver_core::store::{KeyValueStore, MemoryStore};
use receiver_core::{Credentials, NotificationSender, PushClient, ReceiverEvent, SenderConfig};

use common::ErrorLocation;

use std::collections::VecDeque;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Semaphore, mpsc};

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

pub fn sender_config(api_key: &str) -> SenderConfig {
    SenderConfig::new(api_key, "1:1234:web:abcd", "push-project")
}

/// Scriptable push client.
///
/// Registration returns `token-<n>` where `n` counts register calls. When
/// built with [`ScriptedPushClient::gated`], `listen` blocks until
/// [`ScriptedPushClient::open_gate`] is called, which keeps an attempt in
/// flight long enough for concurrent callers to pile up behind it.
#[derive(Default)]
pub struct ScriptedPushClient {
    register_calls: AtomicUsize,
    listen_calls: AtomicUsize,
    register_failures: Mutex<VecDeque<String>>,
    listen_failures: Mutex<VecDeque<String>>,
    gate: Option<Semaphore>,
    last_listen: Mutex<Option<(ListenRequest, ListenOptions)>>,
    sender: Mutex<Option<NotificationSender>>,
}

impl ScriptedPushClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn fail_next_register(self, message: &str) -> Self {
        self.register_failures
            .lock()
            .unwrap()
            .push_back(message.to_string());
        self
    }

    pub fn fail_next_listen(self, message: &str) -> Self {
        self.listen_failures
            .lock()
            .unwrap()
            .push_back(message.to_string());
        self
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1024);
        }
    }

    pub fn register_count(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn listen_count(&self) -> usize {
        self.listen_calls.load(Ordering::SeqCst)
    }

    pub fn last_listen(&self) -> Option<(ListenRequest, ListenOptions)> {
        self.last_listen.lock().unwrap().clone()
    }

    /// The sender handed to the most recent successful `listen`.
    pub fn notification_sender(&self) -> NotificationSender {
        self.sender
            .lock()
            .unwrap()
            .clone()
            .expect("listen has not succeeded yet")
    }
}

#[async_trait]
impl PushClient for ScriptedPushClient {
    async fn register(&self, _config: &SenderConfig) -> Result<Credentials, RegistrationError> {
        let n = self.register_calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(message) = self.register_failures.lock().unwrap().pop_front() {
            return Err(RegistrationError::Rejected {
                message,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut credentials = Credentials::with_token(format!("token-{n}"));
        credentials.extra.insert(
            String::from("gcm"),
            serde_json::json!({ "androidId": format!("android-{n}") }),
        );
        Ok(credentials)
    }

    async fn listen(
        &self,
        request: ListenRequest,
        sender: NotificationSender,
        options: ListenOptions,
    ) -> Result<(), ListenError> {
        self.listen_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        if let Some(message) = self.listen_failures.lock().unwrap().pop_front() {
            return Err(ListenError::Connection {
                message,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        *self.last_listen.lock().unwrap() = Some((request, options));
        *self.sender.lock().unwrap() = Some(sender);
        Ok(())
    }
}

/// In-memory store that rejects every write while `fail_writes` is set.
#[derive(Default)]
pub struct FailingWriteStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FailingWriteStore {
    pub const FAILURE_PATH: &'static str = "/readonly/push-receiver.json";

    pub fn failing() -> Self {
        let store = Self::default();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }
}

impl KeyValueStore for FailingWriteStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Write {
                location: ErrorLocation::from(Location::caller()),
                path: PathBuf::from(Self::FAILURE_PATH),
                source: std::io::Error::other("read-only file system"),
            });
        }
        self.inner.set(key, value)
    }
}

/// Wait for the next event or fail the test.
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<ReceiverEvent>) -> ReceiverEvent {
    tokio::time::timeout(EVENT_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for receiver event")
        .expect("event channel closed")
}

/// Pull every event currently queued.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ReceiverEvent>) -> Vec<ReceiverEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Poll `condition` until it holds or the event timeout passes.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + EVENT_TIMEOUT;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met before timeout"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
