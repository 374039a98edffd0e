//! Option value operations
//!
//! Actions that run singly or inside a `$batch`, plus the per-item report
//! a batch produces.

pub mod batch;
pub mod operation;
pub mod report;

pub use batch::{BatchRequest, BatchRequestBuilder, BatchResponseItem, BatchResponseParser};
pub use operation::{BulkOptions, BulkPhase, OptionAction};
pub use report::{BatchReport, BatchResult};
