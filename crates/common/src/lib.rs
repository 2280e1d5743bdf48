//! Stripcast Common Utilities
//!
//! Shared infrastructure for all Stripcast crates:
//! - Error types and result aliases
//! - Virtual and playback clocks for timeline synchronization
//! - Cooperative cancellation
//! - Tracing/logging initialization
//! - Configuration loading

pub mod cancel;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use cancel::*;
pub use clock::*;
pub use config::*;
pub use error::*;
