//! services/client/src/adapters/storage.rs
//!
//! Durable credential storage: a small JSON object file holding the bearer
//! credential under a single key. A missing file or key means logged out.

use newscheck_core::ports::{CredentialStore, PortError, PortResult};
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const TOKEN_KEY: &str = "auth_token";

pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> PortResult<Map<String, Value>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(storage_error(&self.path, e)),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw).map_err(|e| storage_error(&self.path, e))? {
            Value::Object(entries) => Ok(entries),
            _ => Err(PortError::Storage(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
        }
    }

    /// Writes to a sibling temp file, syncs it, then renames it over the target.
    fn store(&self, entries: &Map<String, Value>) -> PortResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| storage_error(parent, e))?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(|e| storage_error(&self.path, e))?;

        let tmp = self.path.with_extension("tmp");
        let mut tmp_file = create_private(&tmp).map_err(|e| storage_error(&tmp, e))?;
        tmp_file
            .write_all(json.as_bytes())
            .and_then(|()| tmp_file.sync_all())
            .map_err(|e| storage_error(&tmp, e))?;
        drop(tmp_file);

        fs::rename(&tmp, &self.path).map_err(|e| storage_error(&self.path, e))?;
        Ok(())
    }
}

/// Creates (or truncates) a file readable and writable by the owner only.
fn create_private(path: &Path) -> std::io::Result<File> {
    // A leftover temp file keeps its old mode; start from a fresh one.
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

fn storage_error(path: &Path, e: impl std::fmt::Display) -> PortError {
    PortError::Storage(format!("{}: {}", path.display(), e))
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, token: &str) -> PortResult<()> {
        let mut entries = self.load().unwrap_or_default();
        entries.insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
        self.store(&entries)?;
        debug!("Credential saved to {}", self.path.display());
        Ok(())
    }

    fn read(&self) -> PortResult<Option<String>> {
        let entries = self.load()?;
        Ok(entries
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn clear(&self) -> PortResult<()> {
        // An unreadable file cannot hold a usable credential; start over.
        let mut entries = self.load().unwrap_or_default();
        entries.remove(TOKEN_KEY);
        if entries.is_empty() {
            match fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(storage_error(&self.path, e)),
            }
        } else {
            self.store(&entries)?;
        }
        debug!("Credential cleared from {}", self.path.display());
        Ok(())
    }
}
