//! In-memory credential storage, used by tests and short-lived sessions.

use std::sync::Mutex;

use crate::ports::{CredentialStore, PortError, PortResult};

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> PortResult<std::sync::MutexGuard<'_, Option<String>>> {
        self.token
            .lock()
            .map_err(|_| PortError::Storage("credential slot poisoned".to_string()))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, token: &str) -> PortResult<()> {
        *self.slot()? = Some(token.to_string());
        Ok(())
    }

    fn read(&self) -> PortResult<Option<String>> {
        Ok(self.slot()?.clone())
    }

    fn clear(&self) -> PortResult<()> {
        *self.slot()? = None;
        Ok(())
    }
}
