//! OptionSet metadata models

pub mod models;

pub use models::{Label, LocalizedLabel, OptionMetadata, OptionSetDef, PicklistAttributeDef};
