use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Failure reported by the registration collaborator.
#[derive(Debug, ThisError)]
pub enum RegistrationError {
    #[error("Registration Rejected Error: {message} {location}")]
    Rejected {
        message: String,
        location: ErrorLocation,
    },

    #[error("Registration Network Error: {message} {location}")]
    Network {
        message: String,
        location: ErrorLocation,
    },
}

impl RegistrationError {
    pub fn message(&self) -> &str {
        match self {
            RegistrationError::Rejected { message, .. }
            | RegistrationError::Network { message, .. } => message,
        }
    }
}
