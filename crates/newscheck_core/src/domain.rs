//! crates/newscheck_core/src/domain.rs
//!
//! Defines the pure, core data structures for the client.
//! These structs are independent of any storage or wire format.

use chrono::{DateTime, Utc};

/// The text a user submitted for classification, plus optional provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckRequest {
    pub input_text: String,
    pub source_platform: Option<String>,
    pub url: Option<String>,
}

impl CheckRequest {
    /// Builds a request, turning blank optional fields into `None`.
    pub fn new(
        input_text: impl Into<String>,
        source_platform: Option<String>,
        url: Option<String>,
    ) -> Self {
        Self {
            input_text: input_text.into(),
            source_platform: non_blank(source_platform),
            url: non_blank(url),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// The classifier's answer for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub label: String,
    /// Always within `[0, 1]`.
    pub confidence: f64,
}

impl Verdict {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence: clamp_confidence(confidence),
        }
    }

    /// Case-insensitive label comparison, folding the same way as search.
    pub fn has_label(&self, label: &str) -> bool {
        self.label.to_lowercase() == label.to_lowercase()
    }

    pub fn confidence_percent(&self) -> f64 {
        self.confidence * 100.0
    }
}

/// Clamps a confidence value into `[0, 1]`. NaN becomes 0.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// One highlighted span of the input and how strongly it drove the verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub span: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Explanation {
    pub summary: String,
    pub method: String,
    pub highlights: Vec<Highlight>,
}

/// A related post found on social media for the submitted text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SocialPost {
    pub text: String,
    pub url: Option<String>,
    pub source: Option<String>,
    pub published: Option<String>,
}

/// Name and version of the model that produced a verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
}

/// A persisted classification result.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Assigned by the remote service; absent until persisted.
    pub id: Option<String>,
    /// `None` when missing or unparseable; sorts as the oldest value.
    pub created_at: Option<DateTime<Utc>>,
    pub request: CheckRequest,
    pub output: Verdict,
    pub explanation: Explanation,
    pub social_context: Vec<SocialPost>,
    pub model: Option<ModelInfo>,
}

// Credentials sent to the login endpoint.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// The bearer credential returned by a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthToken {
    pub token: String,
    pub token_type: String,
}

/// Derived validity of the locally held credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Valid,
    Expired,
    Absent,
}

//=========================================================================================
// History filtering
//=========================================================================================

/// Status selection of the history view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Label(String),
}

impl StatusFilter {
    /// Parses a user selection; `"all"` in any case is the sentinel.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            StatusFilter::All
        } else {
            StatusFilter::Label(value.to_string())
        }
    }

    pub fn matches(&self, verdict: &Verdict) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Label(label) => verdict.has_label(label),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            other => Err(format!("'{}' is not a sort order (newest|oldest)", other)),
        }
    }
}

/// The three user-editable inputs of the history view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub search: String,
    pub status: StatusFilter,
    pub sort: SortOrder,
}

/// The paginator's current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub index: usize,
    pub size: usize,
}

impl PageWindow {
    pub const DEFAULT_SIZE: usize = 10;

    /// A zero size is treated as one.
    pub fn new(index: usize, size: usize) -> Self {
        Self {
            index,
            size: size.max(1),
        }
    }

    pub fn first(size: usize) -> Self {
        Self::new(0, size)
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::first(Self::DEFAULT_SIZE)
    }
}

/// What the history view renders at a given moment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewSnapshot {
    /// Filtered and sorted records, before pagination.
    pub records: Vec<Record>,
    /// The window actually applied, after clamping to the list length.
    pub page: PageWindow,
    pub visible: Vec<Record>,
    pub filters: FilterState,
    /// True while the latest triggered fetch has not completed.
    pub loading: bool,
    /// Message of the latest failed fetch, cleared by the next success.
    pub error: Option<String>,
    /// Refreshes triggered since the view opened.
    pub generation: u64,
    /// Fetch results dropped because a newer refresh had been triggered.
    pub stale_results: u64,
}

impl ViewSnapshot {
    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn page_count(&self) -> usize {
        self.records.len().div_ceil(self.page.size)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.id.as_deref() == Some(id))
    }
}
