//! crates/newscheck_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the client's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific implementations like local storage or HTTP.

use async_trait::async_trait;
use crate::domain::{AuthToken, CheckRequest, LoginRequest, Record, RegisterRequest};
use crate::guard::Route;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., storage, network).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("Credential storage failure: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Durable client-side storage for the single bearer credential.
///
/// Purely storage: no validation happens here.
pub trait CredentialStore: Send + Sync {
    fn save(&self, token: &str) -> PortResult<()>;

    /// Returns `None` when logged out.
    fn read(&self) -> PortResult<Option<String>>;

    fn clear(&self) -> PortResult<()>;
}

/// The remote history of classifications.
///
/// Each call yields exactly one result or one failure. A bearer credential is
/// attached by the implementation; `Unauthorized` is surfaced, never retried.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Submits text for classification and returns the persisted record.
    async fn submit(&self, request: &CheckRequest) -> PortResult<Record>;

    async fn list_history(&self) -> PortResult<Vec<Record>>;

    async fn get_by_id(&self, id: &str) -> PortResult<Record>;

    async fn delete_by_id(&self, id: &str) -> PortResult<()>;
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> PortResult<AuthToken>;

    async fn register(&self, request: &RegisterRequest) -> PortResult<()>;
}

/// The navigation layer the route guard redirects through.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}
