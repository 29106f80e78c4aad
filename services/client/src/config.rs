//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use newscheck_core::session::ExpiryPolicy;
use newscheck_core::PageWindow;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the remote service, without a trailing slash.
    pub api_base_url: String,
    pub credential_path: PathBuf,
    pub log_level: Level,
    pub page_size: usize,
    pub expiry_policy: ExpiryPolicy,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Remote Service ---
        let api_base_url = lookup("API_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8080/api".to_string())
            .trim_end_matches('/')
            .to_string();
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "API_BASE_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_base_url),
            ));
        }

        // --- Local Storage ---
        let credential_path = lookup("CREDENTIAL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".newscheck/credential.json"));

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "WARN".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- History View ---
        let page_size = match lookup("PAGE_SIZE") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "PAGE_SIZE".to_string(),
                        format!("'{}' is not a positive integer", raw),
                    ))
                }
            },
            None => PageWindow::DEFAULT_SIZE,
        };

        let expiry_policy = match lookup("SESSION_REQUIRE_EXP").as_deref().map(str::trim) {
            None | Some("") | Some("false") | Some("0") => ExpiryPolicy::AllowMissing,
            Some("true") | Some("1") => ExpiryPolicy::RequireExp,
            Some(other) => {
                return Err(ConfigError::InvalidValue(
                    "SESSION_REQUIRE_EXP".to_string(),
                    format!("'{}' is not a boolean", other),
                ))
            }
        };

        Ok(Self {
            api_base_url,
            credential_path,
            log_level,
            page_size,
            expiry_policy,
        })
    }
}
