//! Dataverse OptionSet management
//!
//! The [`api`] module is the engine: token caching, payload building, the
//! `$batch` codec and [`api::OptionSetClient`]. [`config`], [`loader`] and
//! [`cli`] make up the command-line front end on top of it.

pub mod api;
pub mod cli;
pub mod config;
pub mod loader;
