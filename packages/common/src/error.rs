use serde::Deserialize;
use thiserror::Error;

/// Generic message used when the store rejects a request without a usable body
pub const GENERIC_API_MESSAGE: &str = "The server rejected the request";

/// Error surfaced by every editing operation.
///
/// Validation errors are raised before any network call. Upload failures are
/// wrapped in [`EditorError::PartialUpload`] so callers know how much of a
/// batch survived.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: request did not complete ({0})")]
    Network(String),

    #[error("{}", api_message(.status, .message))]
    Api { status: u16, message: Option<String> },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("{succeeded} file(s) uploaded, {pending} still pending: {source}")]
    PartialUpload {
        succeeded: usize,
        pending: usize,
        source: Box<EditorError>,
    },
}

fn api_message(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("{} (HTTP {})", GENERIC_API_MESSAGE, status),
    }
}

/// Structured error body returned by the store
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl EditorError {
    pub fn validation(message: impl Into<String>) -> Self {
        EditorError::Validation(message.into())
    }

    pub fn network(detail: impl Into<String>) -> Self {
        EditorError::Network(detail.into())
    }

    pub fn integrity(detail: impl Into<String>) -> Self {
        EditorError::Integrity(detail.into())
    }

    /// Build an error from a non-success HTTP response.
    ///
    /// A structured body's `message` (or `error`) is kept verbatim. A 409 is
    /// mapped to [`EditorError::Conflict`].
    pub fn from_api_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|body| body.message.or(body.error))
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        if status == 409 {
            return EditorError::Conflict(
                message.unwrap_or_else(|| "record was modified by another request".to_string()),
            );
        }

        EditorError::Api { status, message }
    }

    pub fn is_conflict(&self) -> bool {
        match self {
            EditorError::Conflict(_) => true,
            EditorError::Api { status, .. } => *status == 409,
            _ => false,
        }
    }

    /// Whether resubmitting the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            EditorError::Network(_) => true,
            EditorError::Api { status, .. } => *status >= 500,
            EditorError::Integrity(_) => true,
            EditorError::PartialUpload { source, .. } => source.is_retryable(),
            EditorError::Validation(_) | EditorError::Conflict(_) => false,
        }
    }

    /// Number of files that made it before an upload failure
    pub fn succeeded_count(&self) -> Option<usize> {
        match self {
            EditorError::PartialUpload { succeeded, .. } => Some(*succeeded),
            _ => None,
        }
    }

    /// Text for the dismissible error banner
    pub fn banner(&self) -> String {
        match self {
            EditorError::Network(_) => format!(
                "{}. Try again with fewer or smaller files.",
                self
            ),
            EditorError::PartialUpload { source, .. } if matches!(**source, EditorError::Network(_)) => {
                format!("{}. Retry the pending files, or select fewer at a time.", self)
            }
            _ => self.to_string(),
        }
    }
}
