//! Per-item and aggregate outcomes of a `$batch` call

use serde::{Deserialize, Serialize};

use crate::api::error::{OptionSetError, Result};

/// Outcome of one sub-request inside a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Position of the item in the submitted batch
    pub index: usize,
    pub label: String,
    pub value: i32,
    pub status_code: u16,
    pub success: bool,
    /// Reason phrase of the sub-response status line
    pub detail: String,
    /// Server error message from the sub-response body, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregated outcome of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BatchResult>,
    /// Set when no per-item status could be parsed and `succeeded` was
    /// assumed to equal `total`
    #[serde(default)]
    pub estimated: bool,
}

impl BatchReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Append one parsed result and bump the matching counter
    pub fn push(&mut self, result: BatchResult) {
        if result.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed == 0 && self.succeeded == self.total
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// Fold the report of a later, sequential batch into this one.
    ///
    /// Indices of `other` are shifted past every index already present, so
    /// they stay unique even after placeholder results. They count items that
    /// were actually submitted; inputs skipped before sending take no slot.
    pub fn merge(&mut self, other: BatchReport) {
        let offset = self.next_index();
        self.total += other.total;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.estimated |= other.estimated;
        self.results
            .extend(other.results.into_iter().map(|mut r| {
                r.index += offset;
                r
            }));
    }

    /// First index not taken by `total` or by any result
    fn next_index(&self) -> usize {
        self.results
            .iter()
            .map(|r| r.index + 1)
            .max()
            .unwrap_or(0)
            .max(self.total)
    }

    /// Reject estimated reports instead of trusting the optimistic count
    pub fn into_strict(self) -> Result<Self> {
        if self.estimated {
            return Err(OptionSetError::DecodeAmbiguity { total: self.total });
        }
        Ok(self)
    }
}
