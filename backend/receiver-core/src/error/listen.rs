use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Failure reported by the listen collaborator while setting up the stream.
#[derive(Debug, ThisError)]
pub enum ListenError {
    #[error("Listen Connection Error: {message} {location}")]
    Connection {
        message: String,
        location: ErrorLocation,
    },

    #[error("Listen Credentials Error: {message} {location}")]
    InvalidCredentials {
        message: String,
        location: ErrorLocation,
    },
}

impl ListenError {
    pub fn message(&self) -> &str {
        match self {
            ListenError::Connection { message, .. }
            | ListenError::InvalidCredentials { message, .. } => message,
        }
    }
}
