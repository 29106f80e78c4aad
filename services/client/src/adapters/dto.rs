//! services/client/src/adapters/dto.rs
//!
//! Wire representations of the remote service's JSON documents. Each one
//! converts into its pure counterpart from the `core` crate.

use chrono::{DateTime, Utc};
use newscheck_core::domain::{
    AuthToken, CheckRequest, Explanation, Highlight, LoginRequest, ModelInfo, Record,
    RegisterRequest, SocialPost, Verdict,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

//=========================================================================================
// Outgoing Payloads
//=========================================================================================

/// Body of `POST /check`. Absent optional fields are omitted, never sent empty.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CheckPayload<'a> {
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_platform: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<&'a str>,
}

impl<'a> From<&'a CheckRequest> for CheckPayload<'a> {
    fn from(request: &'a CheckRequest) -> Self {
        Self {
            text: &request.input_text,
            source_platform: request.source_platform.as_deref(),
            url: request.url.as_deref(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct CredentialsPayload<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

impl<'a> From<&'a LoginRequest> for CredentialsPayload<'a> {
    fn from(request: &'a LoginRequest) -> Self {
        Self {
            email: &request.email,
            password: &request.password,
        }
    }
}

impl<'a> From<&'a RegisterRequest> for CredentialsPayload<'a> {
    fn from(request: &'a RegisterRequest) -> Self {
        Self {
            email: &request.email,
            password: &request.password,
        }
    }
}

//=========================================================================================
// Incoming Documents
//=========================================================================================

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponseDto {
    pub token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl AuthResponseDto {
    pub fn to_domain(self) -> AuthToken {
        AuthToken {
            token: self.token,
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
        }
    }
}

/// The backend's error body.
#[derive(Deserialize, Debug)]
pub struct ErrorResponseDto {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PredictionDto {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_at: Option<Value>,
    pub request: RequestDto,
    #[serde(default)]
    pub model: Option<ModelDto>,
    pub output: OutputDto,
    #[serde(default)]
    pub explanation: Option<ExplanationDto>,
    #[serde(default)]
    pub social_context: Option<Vec<SocialPostDto>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RequestDto {
    pub input_text: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source_platform: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ModelDto {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Deserialize, Debug)]
pub struct OutputDto {
    pub label: String,
    pub confidence: f64,
}

#[derive(Deserialize, Debug, Default)]
pub struct ExplanationDto {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub highlights: Vec<HighlightDto>,
}

#[derive(Deserialize, Debug)]
pub struct HighlightDto {
    pub span: String,
    pub score: f64,
}

#[derive(Deserialize, Debug)]
pub struct SocialPostDto {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub published: Option<String>,
}

impl PredictionDto {
    pub fn to_domain(self) -> Record {
        let id = self.id;
        let confidence = self.output.confidence;
        if !(0.0..=1.0).contains(&confidence) {
            warn!(
                "Record {:?} carries confidence {} outside [0, 1]; clamping.",
                id, confidence
            );
        }

        let explanation = self.explanation.unwrap_or_default();
        Record {
            created_at: self.created_at.as_ref().and_then(parse_timestamp),
            request: CheckRequest::new(
                self.request.input_text,
                self.request.source_platform,
                self.request.url,
            ),
            output: Verdict::new(self.output.label, confidence),
            explanation: Explanation {
                summary: explanation.summary,
                method: explanation.method,
                highlights: explanation
                    .highlights
                    .into_iter()
                    .map(|h| Highlight {
                        span: h.span,
                        score: h.score,
                    })
                    .collect(),
            },
            social_context: self
                .social_context
                .unwrap_or_default()
                .into_iter()
                .map(|p| SocialPost {
                    text: p.text,
                    url: p.url,
                    source: p.source,
                    published: p.published,
                })
                .collect(),
            model: self.model.map(|m| ModelInfo {
                name: m.name,
                version: m.version,
            }),
            id,
        }
    }
}

/// Accepts RFC 3339 strings or epoch seconds. Anything else is `None`.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .ok(),
        Value::Number(n) => {
            let secs = n.as_f64()?;
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
            DateTime::from_timestamp(whole as i64, nanos)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prediction(created_at: Value) -> PredictionDto {
        serde_json::from_value(json!({
            "id": "665f1c",
            "userId": "u1",
            "createdAt": created_at,
            "request": { "inputText": "Aliens landed", "sourcePlatform": "reddit" },
            "model": { "name": "distilbert-fakenews", "version": "v1" },
            "output": { "label": "FAKE", "confidence": 0.93, "probs": [0.07, 0.93] },
            "explanation": {
                "summary": "Sensational claim",
                "method": "attention",
                "highlights": [ { "span": "Aliens", "score": 0.8 } ]
            },
            "socialContext": [ { "text": "lol", "url": "https://x.example/1", "source": "twitter" } ]
        }))
        .unwrap()
    }

    #[test]
    fn prediction_maps_to_domain() {
        let record = prediction(json!("2024-03-01T12:00:00Z")).to_domain();

        assert_eq!(record.id.as_deref(), Some("665f1c"));
        assert_eq!(record.created_at, DateTime::from_timestamp(1_709_294_400, 0));
        assert_eq!(record.request.input_text, "Aliens landed");
        assert_eq!(record.request.source_platform.as_deref(), Some("reddit"));
        assert_eq!(record.request.url, None);
        assert!(record.output.has_label("fake"));
        assert_eq!(record.explanation.highlights.len(), 1);
        assert_eq!(record.social_context[0].source.as_deref(), Some("twitter"));
        assert_eq!(record.model.unwrap().name, "distilbert-fakenews");
    }

    #[test]
    fn epoch_and_garbage_timestamps() {
        let epoch = prediction(json!(1_709_294_400.5)).to_domain();
        assert_eq!(epoch.created_at.unwrap().timestamp(), 1_709_294_400);

        assert_eq!(prediction(json!("yesterday")).to_domain().created_at, None);
        assert_eq!(prediction(Value::Null).to_domain().created_at, None);
    }

    #[test]
    fn missing_optional_sections_default() {
        let dto: PredictionDto = serde_json::from_value(json!({
            "request": { "inputText": "x", "url": "" },
            "output": { "label": "real", "confidence": 1.4 }
        }))
        .unwrap();
        let record = dto.to_domain();

        assert_eq!(record.id, None);
        assert_eq!(record.request.url, None);
        assert_eq!(record.output.confidence, 1.0);
        assert!(record.social_context.is_empty());
        assert_eq!(record.explanation, Explanation::default());
    }

    #[test]
    fn check_payload_omits_absent_fields() {
        let request = CheckRequest::new("Breaking: ...", Some("twitter".to_string()), None);
        let body = serde_json::to_value(CheckPayload::from(&request)).unwrap();

        assert_eq!(body, json!({ "text": "Breaking: ...", "sourcePlatform": "twitter" }));
    }
}
