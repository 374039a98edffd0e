//! Error type for the OptionSet API layer

use thiserror::Error;

/// Crate-wide result alias for API calls
pub type Result<T> = std::result::Result<T, OptionSetError>;

/// Every failure mode of the OptionSet engine.
///
/// Per-item failures inside a successfully transported `$batch` are *not*
/// errors; they show up as failed entries in a [`BatchReport`](crate::api::BatchReport).
#[derive(Debug, Error)]
pub enum OptionSetError {
    /// Token exchange with the identity provider failed or returned garbage
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// A definition lookup came back 404
    #[error("{what} not found")]
    NotFound { what: String },

    /// Any other non-2xx answer from the metadata API
    #[error("Dataverse API error (HTTP {status}): {message}")]
    RemoteApi {
        status: u16,
        message: String,
        /// Raw request body, kept for diagnosing failed batches
        request_body: Option<String>,
        /// Raw response body as returned by the server
        response_body: String,
    },

    /// A batch response could not be mapped to per-item results
    #[error("Could not decode per-item results for a batch of {total} item(s)")]
    DecodeAmbiguity { total: usize },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OptionSetError {
    pub(crate) fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Build a `RemoteApi` error from a raw response body.
    ///
    /// The message is pulled out of the OData error envelope when there is one.
    pub(crate) fn remote(status: u16, response_body: String, request_body: Option<String>) -> Self {
        let message = extract_error_message(&response_body)
            .unwrap_or_else(|| format!("HTTP {}", status));
        Self::RemoteApi {
            status,
            message,
            request_body,
            response_body,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteApi { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Extract a readable message from a Dataverse error body
///
/// Handles `{"error":{"code":"...","message":"..."}}` and the older
/// `{"Message":"..."}` shape. Falls back to the trimmed raw body.
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(error_obj) = json_value.get("error") {
            if let Some(message) = error_obj.get("message").and_then(|m| m.as_str()) {
                let code = error_obj
                    .get("code")
                    .and_then(|c| c.as_str())
                    .unwrap_or("Unknown");
                return Some(format!("[{}] {}", code, message));
            }
        }

        if let Some(message) = json_value.get("Message").and_then(|m| m.as_str()) {
            return Some(message.to_string());
        }
    }

    Some(trimmed.to_string())
}
