use crate::error::{ListenError, RegistrationError, StoreError};

use thiserror::Error;

/// Everything that can abort a single start attempt.
///
/// The coordinator catches this at its boundary and forwards
/// [`StartError::message`] on the service-error channel.
#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Listen(#[from] ListenError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl StartError {
    pub fn message(&self) -> String {
        match self {
            StartError::Registration(e) => e.message().to_string(),
            StartError::Listen(e) => e.message().to_string(),
            StartError::Store(e) => e.message(),
        }
    }
}
