//! crates/newscheck_core/src/auth.rs
//!
//! Login, registration and logout on top of the auth gateway and the
//! credential store.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{LoginRequest, RegisterRequest};
use crate::ports::{AuthGateway, CredentialStore, PortResult};

pub struct AuthService {
    gateway: Arc<dyn AuthGateway>,
    store: Arc<dyn CredentialStore>,
}

impl AuthService {
    pub fn new(gateway: Arc<dyn AuthGateway>, store: Arc<dyn CredentialStore>) -> Self {
        Self { gateway, store }
    }

    /// Logs in and stores the returned credential, replacing any previous one.
    /// A failed login leaves the store untouched.
    pub async fn login(&self, request: &LoginRequest) -> PortResult<()> {
        let token = self.gateway.login(request).await.map_err(|e| {
            warn!("Login failed for {}: {}", request.email, e);
            e
        })?;
        self.store.save(&token.token)?;
        info!("Logged in as {}", request.email);
        Ok(())
    }

    /// Creates an account. Does not log in.
    pub async fn register(&self, request: &RegisterRequest) -> PortResult<()> {
        self.gateway.register(request).await?;
        info!("Registered account {}", request.email);
        Ok(())
    }

    pub fn logout(&self) -> PortResult<()> {
        self.store.clear()
    }
}
