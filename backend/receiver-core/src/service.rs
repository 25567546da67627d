//! Host-facing entry point.
//!
//! A host calls [`start_push_receiver`] once during setup, then forwards each
//! start request from its consumer through the returned handle.
//!
//! # Architecture
//!
//! Start requests travel over an mpsc channel to a dispatch task. Each request
//! is handled on its own task, so requests overlap exactly as they would when
//! fired by an event-driven consumer; the [`StartupCoordinator`] is what
//! serializes them.

use crate::START_NOTIFICATION_SERVICE;
use crate::client::PushClient;
use crate::coordinator::StartupCoordinator;
use crate::error::ServiceError;
use crate::events::ConsumerTarget;
use crate::models::{ListenOptions, SenderConfig};
use crate::store::{KeyValueStore, PersistentStateStore};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc;

const REQUEST_QUEUE_CAPACITY: usize = 32;

/// Handle to a running push receiver.
///
/// Dropping every clone closes the request queue and stops the dispatch task.
/// An attempt already in flight still runs to completion.
#[derive(Clone)]
pub struct PushReceiverHandle {
    request_tx: mpsc::Sender<SenderConfig>,
    coordinator: StartupCoordinator,
}

impl PushReceiverHandle {
    /// Enqueue a start request. Outcome arrives as an event on the target.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Closed`] if the dispatch task has stopped.
    pub async fn request_start(&self, config: SenderConfig) -> Result<(), ServiceError> {
        self.request_tx
            .send(config)
            .await
            .map_err(|e| ServiceError::Closed {
                message: format!("{START_NOTIFICATION_SERVICE} queue closed: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    pub fn coordinator(&self) -> &StartupCoordinator {
        &self.coordinator
    }
}

/// Wire a coordinator to `target` and start accepting start requests.
///
/// `options` are forwarded to every listen call unchanged.
pub fn start_push_receiver(
    client: Arc<dyn PushClient>,
    store: Arc<dyn KeyValueStore>,
    target: Arc<dyn ConsumerTarget>,
    options: ListenOptions,
) -> PushReceiverHandle {
    let coordinator =
        StartupCoordinator::new(client, PersistentStateStore::new(store), target, options);

    let (request_tx, request_rx) = mpsc::channel(REQUEST_QUEUE_CAPACITY);
    tokio::spawn(dispatch_requests(request_rx, coordinator.clone()));

    info!(
        "Push receiver ready (socket_timeout={:?}, socket_keep_alive_delay={:?})",
        options.socket_timeout, options.socket_keep_alive_delay
    );

    PushReceiverHandle {
        request_tx,
        coordinator,
    }
}

async fn dispatch_requests(
    mut request_rx: mpsc::Receiver<SenderConfig>,
    coordinator: StartupCoordinator,
) {
    while let Some(config) = request_rx.recv().await {
        debug!(
            "Start request received for project {}",
            config.firebase.project_id
        );

        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            coordinator.start(config).await;
        });
    }

    warn!("Start request queue closed, dispatcher stopping");
}
