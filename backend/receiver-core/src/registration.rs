//! Decides whether stored credentials can be reused for a sender.

use crate::client::PushClient;
use crate::error::StartError;
use crate::events::{ConsumerTarget, ReceiverEvent};
use crate::models::{Credentials, SenderConfig};
use crate::store::PersistentStateStore;

use std::sync::Arc;

use log::{debug, info};

/// True when `stored_credentials` cannot be used for `config`.
///
/// Credentials stay valid until the sender's API key changes.
pub fn needs_registration(
    config: &SenderConfig,
    stored_credentials: Option<&Credentials>,
    stored_api_key: Option<&str>,
) -> bool {
    match (stored_credentials, stored_api_key) {
        (Some(_), Some(api_key)) => !config.api_key().matches(api_key),
        _ => true,
    }
}

/// Reuses or refreshes credentials and persists the result.
#[derive(Clone)]
pub struct RegistrationManager {
    client: Arc<dyn PushClient>,
    store: PersistentStateStore,
    target: Arc<dyn ConsumerTarget>,
}

impl RegistrationManager {
    pub fn new(
        client: Arc<dyn PushClient>,
        store: PersistentStateStore,
        target: Arc<dyn ConsumerTarget>,
    ) -> Self {
        Self {
            client,
            store,
            target,
        }
    }

    /// Return credentials valid for `config`, registering if needed.
    ///
    /// On registration the credentials are written first, then the API key,
    /// then `token-updated` is emitted. Nothing is written if registration fails.
    ///
    /// # Errors
    ///
    /// Returns [`StartError::Registration`] unchanged from the client, or
    /// [`StartError::Store`] if persisting the new credentials fails.
    pub async fn ensure_credentials(
        &self,
        config: &SenderConfig,
        stored_credentials: Option<Credentials>,
        stored_api_key: Option<String>,
    ) -> Result<Credentials, StartError> {
        if let Some(credentials) = stored_credentials.as_ref()
            && !needs_registration(config, Some(credentials), stored_api_key.as_deref())
        {
            debug!("Stored credentials match sender API key, reusing them");
            return Ok(credentials.clone());
        }

        info!(
            "Registering with sender (project={}, app={})",
            config.firebase.project_id, config.firebase.app_id
        );

        let credentials = self.client.register(config).await?;

        self.store.set_credentials(&credentials)?;
        self.store.set_registered_api_key(config.api_key().as_str())?;

        info!("Registration succeeded, credentials persisted");

        self.target.send(ReceiverEvent::TokenUpdated {
            token: credentials.token().map(str::to_string),
        });

        Ok(credentials)
    }
}
