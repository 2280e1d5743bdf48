//! The closed strip variant set and construction from descriptions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use stripcast_common::clock::frame_interval_ms;
use stripcast_common::error::StripcastResult;
use stripcast_project_model::asset::Asset;
use stripcast_project_model::strip::{StripBase, StripDescription, StripKind};

use crate::audio::AudioStrip;
use crate::image::ImageStrip;
use crate::media::MediaFactory;
use crate::quad::Quad;
use crate::source::EncodeSource;
use crate::sync::{PlayMode, SyncSettings};
use crate::text::TextStrip;
use crate::video::VideoStrip;

/// Placement of a strip on the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripTiming {
    pub start: f64,
    pub length: f64,
    pub layer: i32,
}

impl StripTiming {
    pub fn end(&self) -> f64 {
        self.start + self.length
    }

    /// Strict open interval: a strip is not active on its own boundaries.
    pub fn is_active(&self, time: f64) -> bool {
        self.start < time && time < self.end()
    }

    /// Rebuild the persisted base fields.
    pub fn to_base(&self, id: &str, asset: Option<&Asset>) -> StripBase {
        let base = StripBase::new(self.start, self.length, self.layer).with_id(id);
        match asset {
            Some(asset) => base.with_asset(asset.id.clone(), asset.path.clone()),
            None => base,
        }
    }
}

impl From<&StripBase> for StripTiming {
    fn from(base: &StripBase) -> Self {
        Self {
            start: base.start,
            length: base.length,
            layer: base.layer,
        }
    }
}

/// A runtime timeline strip.
pub enum Strip {
    Video(VideoStrip),
    Audio(AudioStrip),
    Image(ImageStrip),
    Text(TextStrip),
}

impl Strip {
    /// Build a strip from its description, resolving `assetId` against `assets`.
    pub fn from_description(
        desc: &StripDescription,
        assets: &[Asset],
        factory: &dyn MediaFactory,
        sync: SyncSettings,
    ) -> Self {
        let id = desc.base().id.clone().unwrap_or_else(generate_strip_id);
        let asset = desc
            .asset_id()
            .and_then(|asset_id| assets.iter().find(|a| a.id == asset_id))
            .cloned();
        if desc.asset_id().is_some() && asset.is_none() {
            tracing::warn!(
                strip = %id,
                asset = desc.asset_id().unwrap_or_default(),
                "Strip references an unknown asset"
            );
        }

        match desc {
            StripDescription::Video(d) => {
                Strip::Video(VideoStrip::new(id, d, asset, factory, sync))
            }
            StripDescription::Audio(d) => {
                Strip::Audio(AudioStrip::new(id, d, asset, factory, sync))
            }
            StripDescription::Image(d) => Strip::Image(ImageStrip::new(id, d, asset, factory)),
            StripDescription::Text(d) => Strip::Text(TextStrip::new(id, d)),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Strip::Video(s) => s.id(),
            Strip::Audio(s) => s.id(),
            Strip::Image(s) => s.id(),
            Strip::Text(s) => s.id(),
        }
    }

    pub fn kind(&self) -> StripKind {
        match self {
            Strip::Video(_) => StripKind::Video,
            Strip::Audio(_) => StripKind::Audio,
            Strip::Image(_) => StripKind::Image,
            Strip::Text(_) => StripKind::Text,
        }
    }

    pub fn timing(&self) -> &StripTiming {
        match self {
            Strip::Video(s) => &s.timing,
            Strip::Audio(s) => &s.timing,
            Strip::Image(s) => &s.timing,
            Strip::Text(s) => &s.timing,
        }
    }

    pub fn is_active(&self, time: f64) -> bool {
        self.timing().is_active(time)
    }

    /// Whether the strip is still waiting for its media to load.
    pub fn is_pending(&self) -> bool {
        match self {
            Strip::Video(s) => s.is_pending(),
            Strip::Audio(s) => s.is_pending(),
            Strip::Image(s) => s.is_pending(),
            Strip::Text(_) => false,
        }
    }

    /// Synchronize the strip to timeline time `time` (seconds).
    ///
    /// `delta_ms` is the caller's tick interval. In [`PlayMode::FrameExact`]
    /// the call resolves only after the media confirmed the position and
    /// fails with `SeekTimeout` when it does not.
    pub async fn update(
        &mut self,
        time: f64,
        delta_ms: f64,
        is_playing: bool,
        mode: PlayMode,
        fps: f64,
    ) -> StripcastResult<()> {
        match self {
            Strip::Video(s) => s.update(time, delta_ms, is_playing, mode, fps).await,
            Strip::Audio(s) => s.update(time, delta_ms, is_playing, mode, fps).await,
            Strip::Image(s) => {
                s.update(time);
                Ok(())
            }
            Strip::Text(s) => {
                s.update(time);
                Ok(())
            }
        }
    }

    /// Render-ready quad, for visual strips.
    pub fn quad(&self) -> Option<&Quad> {
        match self {
            Strip::Video(s) => Some(s.quad()),
            Strip::Image(s) => Some(s.quad()),
            Strip::Text(s) => Some(s.quad()),
            Strip::Audio(_) => None,
        }
    }

    pub fn to_description(&self) -> StripDescription {
        match self {
            Strip::Video(s) => StripDescription::Video(s.to_description()),
            Strip::Audio(s) => StripDescription::Audio(s.to_description()),
            Strip::Image(s) => StripDescription::Image(s.to_description()),
            Strip::Text(s) => StripDescription::Text(s.to_description()),
        }
    }

    /// Encoder view of a media-bearing strip; `None` for stills, text, and
    /// strips without an asset.
    pub fn encode_source(&self) -> Option<EncodeSource> {
        match self {
            Strip::Video(s) => s.encode_source(),
            Strip::Audio(s) => s.encode_source(),
            Strip::Image(_) | Strip::Text(_) => None,
        }
    }
}

impl fmt::Debug for Strip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strip")
            .field("kind", &self.kind())
            .field("id", &self.id())
            .field("timing", self.timing())
            .finish_non_exhaustive()
    }
}

/// Build runtime strips for every description, in order.
pub fn build_strips(
    descriptions: &[StripDescription],
    assets: &[Asset],
    factory: &dyn MediaFactory,
    sync: SyncSettings,
) -> Vec<Strip> {
    let strips: Vec<Strip> = descriptions
        .iter()
        .map(|desc| Strip::from_description(desc, assets, factory, sync))
        .collect();
    tracing::info!(count = strips.len(), "Built timeline strips");
    strips
}

const MEDIA_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Update `strips` at time zero until no strip is waiting on media or
/// `timeout` elapses. Returns the ids still pending.
pub async fn wait_for_media(
    strips: &mut [Strip],
    fps: f64,
    timeout: Duration,
) -> StripcastResult<Vec<String>> {
    let deadline = tokio::time::Instant::now() + timeout;
    let delta_ms = frame_interval_ms(fps);
    loop {
        for strip in strips.iter_mut() {
            strip
                .update(0.0, delta_ms, false, PlayMode::Interactive, fps)
                .await?;
        }
        let pending: Vec<String> = strips
            .iter()
            .filter(|s| s.is_pending())
            .map(|s| s.id().to_string())
            .collect();
        if pending.is_empty() || tokio::time::Instant::now() >= deadline {
            return Ok(pending);
        }
        tokio::time::sleep(MEDIA_POLL_INTERVAL).await;
    }
}

/// Random-looking v4-format id; unique within the process.
fn generate_strip_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        (nanos & 0xFFFF_FFFF) as u32,
        ((nanos >> 32) & 0xFFFF) as u16,
        ((nanos >> 48) & 0x0FFF) as u16,
        (0x8000 | (count & 0x3FFF)) as u16,
        (count >> 14) & 0xFFFF_FFFF_FFFF
    )
}
