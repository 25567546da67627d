use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ServiceError {
    #[error("Service Closed Error: {message} {location}")]
    Closed {
        message: String,
        location: ErrorLocation,
    },
}
