//! `$batch` encoding and decoding for option value actions

pub mod builder;
pub mod parser;

pub use builder::{BatchRequest, BatchRequestBuilder};
pub use parser::{BatchResponseItem, BatchResponseParser};
