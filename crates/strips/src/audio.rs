//! Audio strips.

use stripcast_common::clock::is_off_frame_interval;
use stripcast_common::error::StripcastResult;
use stripcast_project_model::asset::Asset;
use stripcast_project_model::strip::{AudioStripDescription, StripKind};

use crate::media::{MediaFactory, MediaSlot};
use crate::source::EncodeSource;
use crate::strip::StripTiming;
use crate::sync::{seek_exact, PlayMode, SyncSettings};

pub struct AudioStrip {
    id: String,
    pub timing: StripTiming,
    slot: MediaSlot,
    sync: SyncSettings,
}

impl AudioStrip {
    pub fn new(
        id: String,
        desc: &AudioStripDescription,
        asset: Option<Asset>,
        factory: &dyn MediaFactory,
        sync: SyncSettings,
    ) -> Self {
        Self {
            id,
            timing: StripTiming::from(&desc.base),
            slot: MediaSlot::bind(asset, factory),
            sync,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn asset(&self) -> Option<&Asset> {
        self.slot.asset()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.is_loaded()
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_pending()
    }

    pub fn volume(&self) -> Option<f32> {
        self.slot.media().map(|m| m.volume())
    }

    pub fn is_paused(&self) -> Option<bool> {
        self.slot.media().map(|m| m.is_paused())
    }

    pub async fn update(
        &mut self,
        time: f64,
        delta_ms: f64,
        is_playing: bool,
        mode: PlayMode,
        fps: f64,
    ) -> StripcastResult<()> {
        if self.slot.poll().is_some() {
            tracing::debug!(strip = %self.id, "Audio strip loaded");
        }
        if !self.slot.is_loaded() {
            return Ok(());
        }

        let media_time = time - self.timing.start;
        let active = self.timing.is_active(time);
        let reseek = is_off_frame_interval(delta_ms, fps, self.sync.fps_tolerance_ms);
        let Some(media) = self.slot.media_mut() else {
            return Ok(());
        };

        // Outside the window the track is paused as well as muted.
        if !active {
            media.set_volume(0.0);
            if !media.is_paused() {
                media.pause();
            }
            return Ok(());
        }

        media.set_volume(1.0);
        if is_playing && media.is_paused() {
            media.play();
            media.set_position(media_time);
        }
        if !is_playing {
            media.pause();
        }
        if reseek {
            media.set_position(media_time);
        }
        if mode == PlayMode::FrameExact {
            seek_exact(media, &self.id, media_time, &self.sync).await?;
        }
        Ok(())
    }

    pub fn to_description(&self) -> AudioStripDescription {
        AudioStripDescription {
            base: self.timing.to_base(&self.id, self.slot.asset()),
        }
    }

    pub fn encode_source(&self) -> Option<EncodeSource> {
        let asset = self.slot.asset().filter(|a| a.is_playable())?.clone();
        Some(EncodeSource {
            strip_id: self.id.clone(),
            kind: StripKind::Audio,
            asset,
            start: self.timing.start,
            length: self.timing.length,
            video_offset: 0.0,
            has_audio: true,
        })
    }
}
