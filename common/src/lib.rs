//! Shared domain types and client configuration.

pub mod config;
pub mod types;

pub use config::{ConfigError, SynthConfig};
pub use types::*;
