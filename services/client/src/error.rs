//! services/client/src/error.rs
//!
//! Defines the primary error type for the client service.

use crate::config::ConfigError;
use newscheck_core::ports::PortError;

/// The primary error type for the `client` service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("{0}")]
    Port(#[from] PortError),

    /// Represents an error from the HTTP client library.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A protected destination was requested without a valid session.
    #[error("Not logged in (or the session expired). Run `newscheck login` first.")]
    NotAuthenticated,

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
