//! Submission of new text for classification.

use tracing::info;

use crate::domain::{CheckRequest, Record};
use crate::ports::{PortError, PortResult, RecordSource};

/// Submits text for classification.
///
/// Blank optional fields are sent as absent, and blank text is rejected
/// before any network call.
pub async fn submit_check(
    source: &dyn RecordSource,
    text: &str,
    source_platform: Option<String>,
    url: Option<String>,
) -> PortResult<Record> {
    if text.trim().is_empty() {
        return Err(PortError::Invalid("text cannot be blank".to_string()));
    }
    let request = CheckRequest::new(text, source_platform, url);
    let record = source.submit(&request).await?;
    info!(
        "Classified as {} ({:.1}%)",
        record.output.label,
        record.output.confidence_percent()
    );
    Ok(record)
}
