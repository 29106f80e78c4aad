//! services/client/src/adapters/http.rs
//!
//! HTTP adapters for the remote classification service: the concrete
//! implementations of the `RecordSource` and `AuthGateway` ports.

use async_trait::async_trait;
use newscheck_core::domain::{AuthToken, CheckRequest, LoginRequest, Record, RegisterRequest};
use newscheck_core::ports::{AuthGateway, PortError, PortResult, RecordSource};
use newscheck_core::session::SessionValidator;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::adapters::dto::{
    AuthResponseDto, CheckPayload, CredentialsPayload, ErrorResponseDto, PredictionDto,
};
use crate::error::ClientError;

/// Builds the shared HTTP client used by both adapters.
pub fn build_http_client() -> Result<Client, ClientError> {
    let client = Client::builder()
        .user_agent(concat!("newscheck/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

//=========================================================================================
// Shared Request Helpers
//=========================================================================================

async fn send(request: RequestBuilder, what: &str) -> PortResult<Response> {
    let response = request.send().await.map_err(|e| {
        warn!("Request for {} failed: {}", what, e);
        PortError::Unexpected(format!("could not reach the service: {}", e))
    })?;
    check_status(response, what).await
}

/// Maps non-success statuses onto port errors. Never retries.
async fn check_status(response: Response, what: &str) -> PortResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    debug!("{} answered {}", what, status);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PortError::Unauthorized),
        StatusCode::NOT_FOUND => Err(PortError::NotFound(what.to_string())),
        _ => {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponseDto>(&body)
                .ok()
                .and_then(|e| e.message.or(e.error))
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| {
                    if body.trim().is_empty() {
                        status.canonical_reason().unwrap_or("request failed").to_string()
                    } else {
                        body
                    }
                });
            Err(PortError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> PortResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| PortError::Unexpected(format!("malformed {} response: {}", what, e)))
}

//=========================================================================================
// HttpRecordSource
//=========================================================================================

/// Talks to `/check` and `/history`, attaching the bearer credential when a
/// valid one is stored.
#[derive(Clone)]
pub struct HttpRecordSource {
    client: Client,
    base_url: String,
    session: SessionValidator,
}

impl HttpRecordSource {
    pub fn new(client: Client, base_url: impl Into<String>, session: SessionValidator) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> PortResult<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            PortError::Unexpected(format!("invalid base URL {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| PortError::Unexpected(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `{base}/history/{id}`. The id is always a single path segment.
    fn record_url(&self, id: &str) -> PortResult<Url> {
        if matches!(id.trim(), "" | "." | "..") {
            return Err(PortError::Invalid(format!("'{}' is not a record id", id)));
        }
        self.url(&["history", id])
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn submit(&self, request: &CheckRequest) -> PortResult<Record> {
        let builder = self
            .request(Method::POST, self.url(&["check"])?)
            .json(&CheckPayload::from(request));
        let response = send(builder, "check").await?;
        let dto: PredictionDto = decode(response, "check").await?;
        Ok(dto.to_domain())
    }

    async fn list_history(&self) -> PortResult<Vec<Record>> {
        let url = self.url(&["history"])?;
        let response = send(self.request(Method::GET, url), "history").await?;
        let dtos: Vec<PredictionDto> = decode(response, "history").await?;
        Ok(dtos.into_iter().map(PredictionDto::to_domain).collect())
    }

    async fn get_by_id(&self, id: &str) -> PortResult<Record> {
        let url = self.record_url(id)?;
        let what = format!("history record {}", id);
        let response = send(self.request(Method::GET, url), &what).await?;
        let dto: PredictionDto = decode(response, &what).await?;
        Ok(dto.to_domain())
    }

    async fn delete_by_id(&self, id: &str) -> PortResult<()> {
        let url = self.record_url(id)?;
        let what = format!("history record {}", id);
        send(self.request(Method::DELETE, url), &what).await?;
        Ok(())
    }
}

//=========================================================================================
// HttpAuthGateway
//=========================================================================================

#[derive(Clone)]
pub struct HttpAuthGateway {
    client: Client,
    base_url: String,
}

impl HttpAuthGateway {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn login(&self, request: &LoginRequest) -> PortResult<AuthToken> {
        let builder = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&CredentialsPayload::from(request));
        let response = send(builder, "login").await?;
        let dto: AuthResponseDto = decode(response, "login").await?;
        Ok(dto.to_domain())
    }

    async fn register(&self, request: &RegisterRequest) -> PortResult<()> {
        let builder = self
            .client
            .post(format!("{}/auth/register", self.base_url))
            .json(&CredentialsPayload::from(request));
        send(builder, "register").await?;
        Ok(())
    }
}
