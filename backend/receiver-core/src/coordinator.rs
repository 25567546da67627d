//! Single-flight start coordination.
//!
//! The consumer may fire any number of start requests, back to back or
//! concurrently. The coordinator guarantees that registration and listen
//! setup run at most once at a time, and never again once listening.
//!
//! # State machine
//!
//! ```text
//! Idle ──start──▶ Starting(attempt) ──ok──▶ Started
//!   ▲                    │
//!   └──────failure───────┘
//! ```
//!
//! `Starting` holds a shared handle to the in-flight attempt. Later callers
//! clone the handle and await it instead of running the attempt themselves.
//! The attempt runs on its own task, so it always finishes even if every
//! caller stops waiting.

use crate::client::PushClient;
use crate::dedup::DedupTracker;
use crate::error::StartError;
use crate::events::{ConsumerTarget, ReceiverEvent};
use crate::models::{ListenOptions, ListenRequest, SenderConfig};
use crate::registration::RegistrationManager;
use crate::relay::NotificationRelay;
use crate::store::PersistentStateStore;
use crate::CHANNEL_PREFIX;

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use log::{debug, error, info};
use tokio::sync::Mutex;

/// Result of one call to [`StartupCoordinator::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Listening. Carries the FCM token the service started with.
    Started { token: Option<String> },

    /// The attempt this call ran or waited on failed.
    Failed { message: String },
}

type InFlight = Shared<BoxFuture<'static, StartOutcome>>;

enum CoordinatorState {
    Idle,
    Starting(InFlight),
    Started { token: Option<String> },
}

enum Step {
    AlreadyStarted(Option<String>),
    Wait(InFlight),
    Run(InFlight),
}

struct CoordinatorInner {
    client: Arc<dyn PushClient>,
    store: PersistentStateStore,
    target: Arc<dyn ConsumerTarget>,
    registration: RegistrationManager,
    dedup: DedupTracker,
    options: ListenOptions,
    state: Mutex<CoordinatorState>,
}

/// Serializes start requests and drives registration then listen.
///
/// This type is `Clone`; all clones share one state machine. Create exactly
/// one per process and hand clones to whatever receives start requests.
#[derive(Clone)]
pub struct StartupCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl StartupCoordinator {
    pub fn new(
        client: Arc<dyn PushClient>,
        store: PersistentStateStore,
        target: Arc<dyn ConsumerTarget>,
        options: ListenOptions,
    ) -> Self {
        let registration =
            RegistrationManager::new(Arc::clone(&client), store.clone(), Arc::clone(&target));
        let dedup = DedupTracker::new(store.clone());

        Self {
            inner: Arc::new(CoordinatorInner {
                client,
                store,
                target,
                registration,
                dedup,
                options,
                state: Mutex::new(CoordinatorState::Idle),
            }),
        }
    }

    /// Handle one start request.
    ///
    /// - Already started: re-emit `service-started` with the current token.
    /// - Attempt in flight: wait for it. If it succeeded, behave as already
    ///   started; if it failed, report the same failure without retrying.
    /// - Idle: run a new attempt, which emits exactly one of
    ///   `service-started` or `service-error`.
    pub async fn start(&self, config: SenderConfig) -> StartOutcome {
        loop {
            let step = {
                let mut state = self.inner.state.lock().await;
                match &*state {
                    CoordinatorState::Started { token } => Step::AlreadyStarted(token.clone()),
                    CoordinatorState::Starting(in_flight) => Step::Wait(in_flight.clone()),
                    CoordinatorState::Idle => {
                        let in_flight = self.spawn_attempt(config.clone());
                        *state = CoordinatorState::Starting(in_flight.clone());
                        Step::Run(in_flight)
                    }
                }
            };

            match step {
                Step::AlreadyStarted(token) => {
                    debug!("Push receiver already started, re-sending token");
                    self.inner.target.send(ReceiverEvent::ServiceStarted {
                        token: token.clone(),
                    });
                    return StartOutcome::Started { token };
                }
                Step::Wait(in_flight) => {
                    debug!("Start already in progress, waiting for it to finish");
                    if let failed @ StartOutcome::Failed { .. } = in_flight.await {
                        return failed;
                    }
                }
                Step::Run(in_flight) => return in_flight.await,
            }
        }
    }

    /// True once listen setup has completed.
    pub async fn is_started(&self) -> bool {
        matches!(
            *self.inner.state.lock().await,
            CoordinatorState::Started { .. }
        )
    }

    /// True while an attempt is in flight.
    pub async fn is_starting(&self) -> bool {
        matches!(
            *self.inner.state.lock().await,
            CoordinatorState::Starting(_)
        )
    }

    fn spawn_attempt(&self, config: SenderConfig) -> InFlight {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let outcome = inner.run_attempt(&config).await;
            inner.conclude(&outcome).await;
            outcome
        });

        let inner = Arc::clone(&self.inner);
        async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("{CHANNEL_PREFIX}Start attempt aborted: {e}");
                    let message = format!("Start attempt aborted: {e}");
                    inner.target.send(ReceiverEvent::ServiceError {
                        message: message.clone(),
                    });
                    let outcome = StartOutcome::Failed { message };
                    inner.conclude(&outcome).await;
                    outcome
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl CoordinatorInner {
    async fn run_attempt(&self, config: &SenderConfig) -> StartOutcome {
        match self.register_and_listen(config).await {
            Ok(token) => {
                info!("Push receiver listening for notifications");
                self.target.send(ReceiverEvent::ServiceStarted {
                    token: token.clone(),
                });
                StartOutcome::Started { token }
            }
            Err(e) => {
                error!("{CHANNEL_PREFIX}Error while starting the service: {e}");
                let message = e.message();
                self.target.send(ReceiverEvent::ServiceError {
                    message: message.clone(),
                });
                StartOutcome::Failed { message }
            }
        }
    }

    async fn register_and_listen(&self, config: &SenderConfig) -> Result<Option<String>, StartError> {
        let stored = self.store.snapshot()?;
        debug!(
            "Loaded stored state: credentials={}, delivered_ids={}",
            stored.credentials.is_some(),
            stored.delivered_ids.len()
        );

        let credentials = self
            .registration
            .ensure_credentials(config, stored.credentials, stored.api_key)
            .await?;
        let token = credentials.token().map(str::to_string);

        let sender =
            NotificationRelay::new(self.dedup.clone(), Arc::clone(&self.target)).spawn();

        let request = ListenRequest {
            credentials,
            persistent_ids: stored.delivered_ids,
        };
        self.client.listen(request, sender, self.options).await?;

        Ok(token)
    }

    /// Leave `Starting`: to `Started` on success, back to `Idle` on failure.
    async fn conclude(&self, outcome: &StartOutcome) {
        let mut state = self.state.lock().await;
        if !matches!(*state, CoordinatorState::Starting(_)) {
            return;
        }
        *state = match outcome {
            StartOutcome::Started { token } => CoordinatorState::Started {
                token: token.clone(),
            },
            StartOutcome::Failed { .. } => CoordinatorState::Idle,
        };
    }
}
