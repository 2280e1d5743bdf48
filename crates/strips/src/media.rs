//! Media handle contract.
//!
//! A media handle is the decoder side of a strip: it owns a playhead,
//! reports metadata once the source is decodable, and can be asked to seek
//! and confirm arrival at an exact position.

use std::sync::Arc;

use async_trait::async_trait;
use stripcast_common::error::StripcastResult;
use stripcast_project_model::asset::Asset;
use tokio::sync::watch;

/// An RGBA8 raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA bytes, `width * height * 4` long.
    pub rgba: Vec<u8>,
}

impl Frame {
    /// Wrap raw RGBA bytes, returning `None` if the length does not match.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        (rgba.len() == width as usize * height as usize * 4).then_some(Self {
            width,
            height,
            rgba,
        })
    }

    /// A frame filled with one color.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        let mut rgba = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            rgba.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            rgba,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.rgba[idx],
            self.rgba[idx + 1],
            self.rgba[idx + 2],
            self.rgba[idx + 3],
        ]
    }
}

/// Decodable properties of a media source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaMetadata {
    /// Native width in pixels (0 for audio).
    pub width: u32,
    /// Native height in pixels (0 for audio).
    pub height: u32,
    /// Duration in seconds, 0 for stills.
    pub duration_secs: f64,
    /// Whether the source carries an audio stream.
    pub has_audio: bool,
}

/// Decoder-side handle for one strip's media.
#[async_trait]
pub trait MediaHandle: Send {
    /// Channel that yields metadata once the source is decodable.
    fn metadata(&self) -> watch::Receiver<Option<MediaMetadata>>;

    fn is_paused(&self) -> bool;

    /// Start natural playback from the current position.
    fn play(&mut self);

    fn pause(&mut self);

    fn volume(&self) -> f32;

    fn set_volume(&mut self, volume: f32);

    /// Current playhead position in media seconds.
    fn position_secs(&self) -> f64;

    /// Move the playhead without waiting for the decoder.
    fn set_position(&mut self, secs: f64);

    /// Move the playhead and resolve once the decoder confirms arrival.
    async fn seek(&mut self, secs: f64) -> StripcastResult<()>;

    /// Most recent decoded picture, if the source is visual.
    fn current_frame(&self) -> Option<Arc<Frame>>;
}

/// Opens media handles for assets.
pub trait MediaFactory {
    fn open(&self, asset: &Asset) -> Box<dyn MediaHandle>;
}

/// Factory for planning and validation: handles never load, so strips
/// keep their timing and asset binding without touching the media.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMediaFactory;

impl MediaFactory for NullMediaFactory {
    fn open(&self, _asset: &Asset) -> Box<dyn MediaHandle> {
        let (tx, rx) = watch::channel(None);
        Box::new(UnloadedMedia {
            _metadata_tx: tx,
            metadata_rx: rx,
            position: 0.0,
            volume: 1.0,
        })
    }
}

struct UnloadedMedia {
    _metadata_tx: watch::Sender<Option<MediaMetadata>>,
    metadata_rx: watch::Receiver<Option<MediaMetadata>>,
    position: f64,
    volume: f32,
}

#[async_trait]
impl MediaHandle for UnloadedMedia {
    fn metadata(&self) -> watch::Receiver<Option<MediaMetadata>> {
        self.metadata_rx.clone()
    }

    fn is_paused(&self) -> bool {
        true
    }

    fn play(&mut self) {}

    fn pause(&mut self) {}

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn position_secs(&self) -> f64 {
        self.position
    }

    fn set_position(&mut self, secs: f64) {
        self.position = secs;
    }

    async fn seek(&mut self, secs: f64) -> StripcastResult<()> {
        self.position = secs;
        Ok(())
    }

    fn current_frame(&self) -> Option<Arc<Frame>> {
        None
    }
}

/// A strip's binding to its asset and the media opened for it.
pub struct MediaSlot {
    asset: Option<Asset>,
    media: Option<Box<dyn MediaHandle>>,
    metadata_rx: Option<watch::Receiver<Option<MediaMetadata>>>,
    metadata: Option<MediaMetadata>,
}

impl MediaSlot {
    pub fn empty() -> Self {
        Self {
            asset: None,
            media: None,
            metadata_rx: None,
            metadata: None,
        }
    }

    /// Open media for `asset` through `factory`. `None` yields an empty slot.
    pub fn bind(asset: Option<Asset>, factory: &dyn MediaFactory) -> Self {
        let Some(asset) = asset else {
            return Self::empty();
        };
        let media = factory.open(&asset);
        let metadata_rx = media.metadata();
        Self {
            asset: Some(asset),
            media: Some(media),
            metadata_rx: Some(metadata_rx),
            metadata: None,
        }
    }

    /// Pick up metadata published since the last call.
    ///
    /// Returns the metadata only on the transition to loaded, after marking
    /// the asset valid.
    pub fn poll(&mut self) -> Option<MediaMetadata> {
        if self.metadata.is_some() {
            return None;
        }
        let metadata = (*self.metadata_rx.as_ref()?.borrow())?;
        self.metadata = Some(metadata);
        if let Some(asset) = &mut self.asset {
            asset.valid = true;
        }
        Some(metadata)
    }

    pub fn is_loaded(&self) -> bool {
        self.metadata.is_some()
    }

    /// Bound to media whose metadata has not been picked up yet.
    pub fn is_pending(&self) -> bool {
        self.media.is_some() && self.metadata.is_none()
    }

    pub fn metadata(&self) -> Option<MediaMetadata> {
        self.metadata
    }

    pub fn asset(&self) -> Option<&Asset> {
        self.asset.as_ref()
    }

    pub fn media(&self) -> Option<&(dyn MediaHandle + 'static)> {
        self.media.as_deref()
    }

    pub fn media_mut(&mut self) -> Option<&mut (dyn MediaHandle + 'static)> {
        self.media.as_deref_mut()
    }
}
