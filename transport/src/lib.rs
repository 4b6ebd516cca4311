//! reqwest client for the SlideSynth service.

pub mod client;
pub mod error;

pub use client::HttpTransport;
pub use error::{Result, TransportError};
