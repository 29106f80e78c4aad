//! crates/newscheck_core/src/session.rs
//!
//! Decides, without a network call, whether the locally held credential is
//! still usable. The token's signature is never checked; only its embedded
//! `exp` claim is read.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::domain::SessionState;
use crate::ports::CredentialStore;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Why a token could not be decoded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TokenError {
    #[error("expected 3 dot-separated segments, found {0}")]
    Segments(usize),
    #[error("payload segment is not base64")]
    Base64,
    #[error("payload is not JSON: {0}")]
    Json(String),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("exp claim is not numeric")]
    NonNumericExpiry,
}

/// What to do with a well-formed token that carries no `exp` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// Treat the token as valid indefinitely.
    #[default]
    AllowMissing,
    /// Treat the token as expired.
    RequireExp,
}

/// Reads the `exp` claim (seconds since epoch) from a three-part token.
///
/// `exp` must be a JSON number. A string is never coerced, even one that
/// spells a number such as `"9999999999"`; it is reported as
/// [`TokenError::NonNumericExpiry`] and the token fails closed.
pub fn decode_expiry(token: &str) -> Result<Option<f64>, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Segments(segments.len()));
    }

    let payload = URL_SAFE_LENIENT
        .decode(segments[1])
        .or_else(|_| STANDARD_LENIENT.decode(segments[1]))
        .map_err(|_| TokenError::Base64)?;

    let claims: Value =
        serde_json::from_slice(&payload).map_err(|e| TokenError::Json(e.to_string()))?;
    let claims = claims.as_object().ok_or(TokenError::NotAnObject)?;

    match claims.get("exp") {
        None | Some(Value::Null) => Ok(None),
        Some(exp) => exp.as_f64().map(Some).ok_or(TokenError::NonNumericExpiry),
    }
}

/// Checks a token against `now`. Decode failures fail closed.
pub fn is_valid_at(token: &str, now: DateTime<Utc>, policy: ExpiryPolicy) -> bool {
    match decode_expiry(token) {
        Ok(Some(exp)) => exp > now.timestamp_millis() as f64 / 1000.0,
        Ok(None) => policy == ExpiryPolicy::AllowMissing,
        Err(e) => {
            debug!("Rejecting undecodable token: {}", e);
            false
        }
    }
}

//=========================================================================================
// SessionValidator
//=========================================================================================

/// Combines the credential store with expiry decoding.
///
/// Reading through the validator never hands out a dead token: an invalid
/// stored token is cleared from the store the moment it is seen.
#[derive(Clone)]
pub struct SessionValidator {
    store: Arc<dyn CredentialStore>,
    policy: ExpiryPolicy,
}

impl SessionValidator {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            policy: ExpiryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn is_valid(&self, token: &str) -> bool {
        is_valid_at(token, Utc::now(), self.policy)
    }

    pub fn state(&self) -> SessionState {
        self.state_at(Utc::now())
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        let stored = match self.store.read() {
            Ok(stored) => stored,
            Err(e) => {
                error!("Failed to read stored credential: {}", e);
                return SessionState::Absent;
            }
        };

        match stored {
            None => SessionState::Absent,
            Some(token) if is_valid_at(&token, now, self.policy) => SessionState::Valid,
            Some(_) => {
                info!("Stored credential is expired or malformed; clearing it.");
                if let Err(e) = self.store.clear() {
                    error!("Failed to clear expired credential: {}", e);
                }
                SessionState::Expired
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Valid
    }

    /// The stored token, only if it is still valid.
    pub fn token(&self) -> Option<String> {
        if !self.is_authenticated() {
            return None;
        }
        self.store.read().ok().flatten()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::memory::MemoryCredentialStore;
    use chrono::Duration;

    /// Builds an unsigned three-part token around the given claims.
    pub(crate) fn token_with(claims: &str) -> String {
        let header = URL_SAFE_LENIENT.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_LENIENT.encode(claims);
        format!("{}.{}.signature", header, body)
    }

    pub(crate) fn token_expiring_in(delta: Duration) -> String {
        let exp = (Utc::now() + delta).timestamp();
        token_with(&format!(r#"{{"sub":"user@example.com","exp":{}}}"#, exp))
    }

    #[test]
    fn past_expiry_is_invalid_and_future_is_valid() {
        let now = Utc::now();
        for hours in [1, 24, 24 * 365] {
            let past = token_with(&format!(r#"{{"exp":{}}}"#, (now - Duration::hours(hours)).timestamp()));
            let future = token_with(&format!(r#"{{"exp":{}}}"#, (now + Duration::hours(hours)).timestamp()));
            assert!(!is_valid_at(&past, now, ExpiryPolicy::AllowMissing));
            assert!(is_valid_at(&future, now, ExpiryPolicy::AllowMissing));
        }
    }

    #[test]
    fn expiry_equal_to_now_is_invalid() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let token = token_with(r#"{"exp":1700000000}"#);
        assert!(!is_valid_at(&token, now, ExpiryPolicy::AllowMissing));
    }

    #[test]
    fn malformed_tokens_fail_closed() {
        let now = Utc::now();
        let not_json = format!("a.{}.c", URL_SAFE_LENIENT.encode("not json"));
        let array = token_with("[1,2,3]");
        let string_exp = token_with(r#"{"exp":"tomorrow"}"#);
        for token in [
            "",
            "opaque-token",
            "a.b",
            "a.b.c.d",
            "a.%%%.c",
            not_json.as_str(),
            array.as_str(),
            string_exp.as_str(),
        ] {
            assert!(!is_valid_at(token, now, ExpiryPolicy::AllowMissing), "{:?}", token);
        }
    }

    #[test]
    fn numeric_string_expiry_is_not_coerced() {
        let token = token_with(r#"{"exp":"9999999999"}"#);
        assert_eq!(decode_expiry(&token), Err(TokenError::NonNumericExpiry));
        assert!(!is_valid_at(&token, Utc::now(), ExpiryPolicy::AllowMissing));
    }

    #[test]
    fn standard_alphabet_with_padding_is_accepted() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let body = STANDARD_LENIENT.encode(format!(r#"{{"exp":{},"n":"??>"}}"#, exp));
        let token = format!("h.{}.s", body);
        assert_eq!(decode_expiry(&token), Ok(Some(exp as f64)));
    }

    #[test]
    fn missing_expiry_follows_policy() {
        let token = token_with(r#"{"sub":"someone"}"#);
        let now = Utc::now();
        assert!(is_valid_at(&token, now, ExpiryPolicy::AllowMissing));
        assert!(!is_valid_at(&token, now, ExpiryPolicy::RequireExp));
    }

    #[test]
    fn invalid_stored_token_is_cleared_on_check() {
        let store = Arc::new(MemoryCredentialStore::with_token(token_expiring_in(-Duration::minutes(5))));
        let session = SessionValidator::new(store.clone());

        assert!(!session.is_authenticated());
        assert_eq!(store.read().unwrap(), None);
        assert_eq!(session.state(), SessionState::Absent);
    }

    #[test]
    fn malformed_stored_token_reports_expired_then_absent() {
        let store = Arc::new(MemoryCredentialStore::with_token("garbage"));
        let session = SessionValidator::new(store.clone());

        assert_eq!(session.state(), SessionState::Expired);
        assert_eq!(session.state(), SessionState::Absent);
        assert_eq!(session.token(), None);
    }

    #[test]
    fn valid_token_check_is_idempotent() {
        let token = token_expiring_in(Duration::hours(2));
        let store = Arc::new(MemoryCredentialStore::with_token(token.clone()));
        let session = SessionValidator::new(store.clone());

        assert!(session.is_authenticated());
        assert!(session.is_authenticated());
        assert_eq!(session.token(), Some(token.clone()));
        assert_eq!(store.read().unwrap(), Some(token));
    }

    #[test]
    fn empty_store_is_absent() {
        let session = SessionValidator::new(Arc::new(MemoryCredentialStore::new()));
        assert_eq!(session.state(), SessionState::Absent);
        assert!(!session.is_authenticated());
    }
}
