//! services/client/src/state.rs
//!
//! The client's shared state, built once at startup from the configuration.

use crate::adapters::{build_http_client, FileCredentialStore, HttpAuthGateway, HttpRecordSource};
use crate::config::Config;
use crate::error::ClientError;
use newscheck_core::ports::{CredentialStore, RecordSource};
use newscheck_core::{AuthService, RouteGuard, SessionValidator};
use std::sync::Arc;

/// Everything a command needs, wired against the configured service.
pub struct AppState {
    pub config: Arc<Config>,
    pub session: SessionValidator,
    pub guard: RouteGuard,
    pub source: Arc<dyn RecordSource>,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Result<Self, ClientError> {
        let store: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::new(config.credential_path.clone()));
        let client = build_http_client()?;
        Ok(Self::with_parts(config, store, client))
    }

    /// Wires the state around an explicit credential store and HTTP client.
    pub fn with_parts(
        config: Arc<Config>,
        store: Arc<dyn CredentialStore>,
        client: reqwest::Client,
    ) -> Self {
        let session = SessionValidator::new(store.clone()).with_policy(config.expiry_policy);
        let guard = RouteGuard::new(session.clone());
        let source = Arc::new(HttpRecordSource::new(
            client.clone(),
            config.api_base_url.clone(),
            session.clone(),
        ));
        let gateway = Arc::new(HttpAuthGateway::new(client, config.api_base_url.clone()));
        let auth = AuthService::new(gateway, store);

        Self {
            config,
            session,
            guard,
            source,
            auth,
        }
    }
}
