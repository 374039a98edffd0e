//! Dataverse OptionSet API
//!
//! Token caching, request payloads, the `$batch` codec and the
//! [`OptionSetClient`] that ties them together.

pub mod auth;
pub mod client;
pub mod constants;
pub mod error;
pub mod metadata;
pub mod models;
pub mod operations;
pub mod payload;
pub mod progress;

pub use auth::TokenCache;
pub use client::{ApiResponse, OptionSetClient};
pub use error::{OptionSetError, Result};
pub use metadata::{Label, LocalizedLabel, OptionMetadata, OptionSetDef, PicklistAttributeDef};
pub use models::{Credentials, TokenInfo};
pub use operations::{BatchReport, BatchResult, BulkOptions, BulkPhase, OptionAction};
pub use payload::{CreateOptionSetRequest, OptionItem, OptionSetType, PayloadBuilder, TargetRef};
pub use progress::{LogProgress, NoopProgress, ProgressSink};
