//! Dataverse $batch request builder
//!
//! Builds the multipart/mixed body for a changeset of option value actions.
//! One outer part wraps a single changeset; every payload becomes one
//! `application/http` sub-part, in input order.

use serde::Serialize;

use crate::api::constants::{headers, methods, CHANGESET_BOUNDARY};
use crate::api::error::Result;
use crate::api::operations::OptionAction;

const CRLF: &str = "\r\n";

/// Builder for creating Dataverse $batch requests
pub struct BatchRequestBuilder {
    batch_id: String,
    action: OptionAction,
    payloads: Vec<String>,
}

impl BatchRequestBuilder {
    /// New builder with a time-derived outer boundary (`batch_<unix millis>`)
    pub fn new(action: OptionAction) -> Self {
        let boundary = format!("batch_{}", chrono::Utc::now().timestamp_millis());
        Self::with_boundary(action, boundary)
    }

    pub fn with_boundary(action: OptionAction, boundary: impl Into<String>) -> Self {
        Self {
            batch_id: boundary.into(),
            action,
            payloads: Vec::new(),
        }
    }

    /// Serialize and queue one payload.
    ///
    /// Compact JSON never contains a raw line break, so a payload line can
    /// never collide with a boundary delimiter.
    pub fn add_payload<T: Serialize>(mut self, payload: &T) -> Result<Self> {
        self.payloads.push(serde_json::to_string(payload)?);
        Ok(self)
    }

    pub fn add_payloads<'a, T, I>(self, payloads: I) -> Result<Self>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        payloads
            .into_iter()
            .try_fold(self, |builder, payload| builder.add_payload(payload))
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Get the batch boundary ID
    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    /// Build the complete batch request body
    pub fn build(self) -> BatchRequest {
        let mut lines: Vec<String> = Vec::with_capacity(4 + self.payloads.len() * 10);

        lines.push(format!("--{}", self.batch_id));
        lines.push(format!("Content-Type: multipart/mixed;boundary={}", CHANGESET_BOUNDARY));
        lines.push(String::new());

        for (index, payload) in self.payloads.iter().enumerate() {
            lines.push(format!("--{}", CHANGESET_BOUNDARY));
            lines.push(format!("Content-Type: {}", headers::CONTENT_TYPE_HTTP));
            lines.push("Content-Transfer-Encoding: binary".to_string());
            lines.push(format!("Content-ID: {}", index + 1));
            lines.push(String::new());
            lines.push(format!("{} {} HTTP/1.1", methods::POST, self.action.action_name()));
            lines.push(format!("Content-Type: {}", headers::CONTENT_TYPE_JSON));
            lines.push(String::new());
            lines.push(payload.clone());
            lines.push(String::new());
        }

        lines.push(format!("--{}--", CHANGESET_BOUNDARY));
        lines.push(format!("--{}--", self.batch_id));

        BatchRequest {
            content_type: format!("multipart/mixed;boundary={}", self.batch_id),
            boundary: self.batch_id,
            body: lines.join(CRLF),
            item_count: self.payloads.len(),
        }
    }
}

/// Complete batch request ready to send
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub content_type: String,
    pub boundary: String,
    pub body: String,
    pub item_count: usize,
}

impl BatchRequest {
    /// Get the Content-Type header value
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Get the request body
    pub fn body(&self) -> &str {
        &self.body
    }
}
