//! Playback modes and the frame-exact seek.

use std::time::Duration;

use stripcast_common::clock::FPS_ERROR_TOLERANCE_MS;
use stripcast_common::config::SyncConfig;
use stripcast_common::error::{StripcastError, StripcastResult};

use crate::media::MediaHandle;

/// Default bound on a frame-exact seek.
pub const ASSET_SEEK_TIMEOUT: Duration = Duration::from_millis(10_000);

/// How a strip synchronizes its media on `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    /// Preview: only re-seek when the tick interval is off the frame grid.
    Interactive,
    /// Capture: wait until the media confirms the exact position.
    FrameExact,
}

/// Tunables for strip synchronization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncSettings {
    pub seek_timeout: Duration,
    pub fps_tolerance_ms: f64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            seek_timeout: ASSET_SEEK_TIMEOUT,
            fps_tolerance_ms: FPS_ERROR_TOLERANCE_MS,
        }
    }
}

impl From<&SyncConfig> for SyncSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            seek_timeout: Duration::from_millis(config.seek_timeout_ms),
            fps_tolerance_ms: config.fps_tolerance_ms,
        }
    }
}

/// Seek `media` to `secs` and wait for confirmation, failing with
/// `SeekTimeout` once the deadline passes.
pub async fn seek_exact(
    media: &mut dyn MediaHandle,
    strip_id: &str,
    secs: f64,
    settings: &SyncSettings,
) -> StripcastResult<()> {
    match tokio::time::timeout(settings.seek_timeout, media.seek(secs)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(strip = strip_id, position_secs = secs, "Media seek timed out");
            Err(StripcastError::seek_timeout(
                strip_id,
                secs,
                settings.seek_timeout.as_millis() as u64,
            ))
        }
    }
}
