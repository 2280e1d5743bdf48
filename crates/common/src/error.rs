//! Error types shared across Stripcast crates.

use std::path::PathBuf;

/// Top-level error type for Stripcast operations.
#[derive(Debug, thiserror::Error)]
pub enum StripcastError {
    /// A strip's media did not confirm the requested position before the deadline.
    #[error("Seek timeout: strip {strip_id} did not reach {position_secs:.4}s within {timeout_ms}ms")]
    SeekTimeout {
        strip_id: String,
        position_secs: f64,
        timeout_ms: u64,
    },

    /// The encoding engine reported failure for one invocation.
    #[error("Engine invocation failed: {message}")]
    EngineInvocation { message: String },

    /// The finished artifact could not be read back or handed off.
    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Project error: {message}")]
    Project { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using StripcastError.
pub type StripcastResult<T> = Result<T, StripcastError>;

impl StripcastError {
    pub fn seek_timeout(strip_id: impl Into<String>, position_secs: f64, timeout_ms: u64) -> Self {
        Self::SeekTimeout {
            strip_id: strip_id.into(),
            position_secs,
            timeout_ms,
        }
    }

    pub fn engine(msg: impl Into<String>) -> Self {
        Self::EngineInvocation {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn project(msg: impl Into<String>) -> Self {
        Self::Project {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error is the result of a cooperative cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
