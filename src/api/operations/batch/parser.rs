//! Dataverse $batch response parser
//!
//! Maps a multipart/mixed changeset response back onto the submitted items.
//! Correlation is strictly positional: the n-th status line that arrives
//! belongs to the n-th input item.

use log::{debug, warn};

use crate::api::constants::CHANGESET_RESPONSE_MARKER;
use crate::api::error::extract_error_message;
use crate::api::operations::report::{BatchReport, BatchResult};
use crate::api::payload::OptionItem;

#[derive(Debug, Clone, Copy)]
enum ParsingState {
    MultipartHeaders,
    HttpHeaders,
    Body,
}

/// One parsed sub-response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResponseItem {
    pub status_code: u16,
    pub reason: String,
    pub body: Option<String>,
}

impl BatchResponseItem {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Parser for batch responses
pub struct BatchResponseParser;

impl BatchResponseParser {
    /// Decode a batch response into a report for `items`.
    ///
    /// Never fails. Extra sub-responses are attributed to a `("?", -1)`
    /// placeholder; a response without a single status line yields an
    /// estimated report with `succeeded == total`.
    pub fn parse(response_text: &str, items: &[OptionItem]) -> BatchReport {
        let mut report = BatchReport::new(items.len());

        for (result_idx, item) in Self::parse_segments(response_text).into_iter().enumerate() {
            let option = items
                .get(result_idx)
                .cloned()
                .unwrap_or_else(OptionItem::placeholder);

            let message = if item.is_success() {
                None
            } else {
                item.body.as_deref().and_then(extract_error_message)
            };

            report.push(BatchResult {
                index: result_idx,
                label: option.label,
                value: option.value,
                status_code: item.status_code,
                success: item.is_success(),
                detail: item.reason,
                message,
            });
        }

        if report.results.is_empty() {
            warn!(
                "Could not parse any sub-response status from batch response; assuming all {} item(s) succeeded",
                report.total
            );
            report.succeeded = report.total;
            report.estimated = true;
        } else if report.results.len() != items.len() {
            warn!(
                "Batch response carried {} status line(s) for {} item(s)",
                report.results.len(),
                items.len()
            );
        }

        debug!(
            "Parsed batch response: {}/{} succeeded, {} failed",
            report.succeeded, report.total, report.failed
        );
        report
    }

    /// Split on the changeset response marker and parse every segment that
    /// contains a status line, in arrival order
    pub fn parse_segments(response_text: &str) -> Vec<BatchResponseItem> {
        response_text
            .split(CHANGESET_RESPONSE_MARKER)
            .filter_map(Self::parse_http_response)
            .collect()
    }

    /// Parse the first `HTTP/1.1` status line of a segment, plus the headers
    /// and body that follow it
    fn parse_http_response(segment: &str) -> Option<BatchResponseItem> {
        let mut state = ParsingState::MultipartHeaders;
        let mut status: Option<(u16, String)> = None;
        let mut body_lines = Vec::new();

        for line in segment.lines() {
            let line = line.trim();

            match state {
                ParsingState::MultipartHeaders => {
                    if line.starts_with("HTTP/1.1") {
                        status = Some(Self::parse_status_line(line));
                        state = ParsingState::HttpHeaders;
                    }
                }
                ParsingState::HttpHeaders => {
                    // Empty line transitions to body
                    if line.is_empty() {
                        state = ParsingState::Body;
                    }
                }
                ParsingState::Body => {
                    // next boundary (batch or changeset) ends the body
                    if line.starts_with("--") {
                        break;
                    }
                    body_lines.push(line);
                }
            }
        }

        let (status_code, reason) = status?;
        let body_text = body_lines.join("\n").trim().to_string();

        Some(BatchResponseItem {
            status_code,
            reason,
            body: (!body_text.is_empty()).then_some(body_text),
        })
    }

    /// `HTTP/1.1 <code> <reason...>`; an unreadable code counts as 0
    fn parse_status_line(line: &str) -> (u16, String) {
        let mut tokens = line.splitn(3, ' ');
        let _version = tokens.next();
        let code = tokens
            .next()
            .and_then(|c| c.trim().parse().ok())
            .unwrap_or(0);
        let reason = tokens.next().unwrap_or("").trim().to_string();
        (code, reason)
    }
}
