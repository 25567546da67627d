//! Shared building blocks for the push receiver workspace.
//!
//! This crate holds the small pieces every other crate leans on:
//!
//! - [`ErrorLocation`]: call-site capture for structured errors
//! - [`RedactedApiKey`]: sender API keys that never leak into logs
//!
//! It deliberately carries no business logic.

pub mod error;
pub mod redacted_key;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use redacted_key::RedactedApiKey;
