//! Option value actions that can run singly or inside a `$batch`

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::constants::actions;

/// The unbound Dataverse action behind an option value change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionAction {
    Insert,
    Update,
    Delete,
}

impl OptionAction {
    /// Action name as it appears in the URL / batch request line
    pub fn action_name(&self) -> &'static str {
        match self {
            Self::Insert => actions::INSERT_OPTION_VALUE,
            Self::Update => actions::UPDATE_OPTION_VALUE,
            Self::Delete => actions::DELETE_OPTION_VALUE,
        }
    }

    /// Upper-case verb for progress messages
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for OptionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action_name())
    }
}

/// Knobs for a bulk call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkOptions {
    /// Send `Prefer: odata.continue-on-error`
    pub continue_on_error: bool,
    /// Only used by updates
    pub merge_labels: bool,
}

impl BulkOptions {
    /// Insert/update default: abort the changeset on the first failure
    pub fn insert() -> Self {
        Self {
            continue_on_error: false,
            merge_labels: false,
        }
    }

    pub fn update() -> Self {
        Self::insert()
    }

    /// Delete default: keep going, values may already be gone
    pub fn delete() -> Self {
        Self {
            continue_on_error: true,
            merge_labels: false,
        }
    }

    pub fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn merge_labels(mut self, merge_labels: bool) -> Self {
        self.merge_labels = merge_labels;
        self
    }
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self::insert()
    }
}

/// Where a bulk call currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkPhase {
    Idle,
    TokenRefreshing,
    PayloadBuilding,
    BatchEncoding,
    InFlight,
    ResponseDecoding,
    Reported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(OptionAction::Insert.action_name(), "InsertOptionValue");
        assert_eq!(OptionAction::Update.to_string(), "UpdateOptionValue");
        assert_eq!(OptionAction::Delete.verb(), "DELETE");
    }

    #[test]
    fn test_bulk_defaults() {
        assert!(!BulkOptions::insert().continue_on_error);
        assert!(!BulkOptions::update().continue_on_error);
        assert!(BulkOptions::delete().continue_on_error);
        assert!(BulkOptions::update().merge_labels(true).merge_labels);
    }
}
