//! Video strips: a textured quad driven by a seekable media handle.

use stripcast_common::clock::is_off_frame_interval;
use stripcast_common::error::StripcastResult;
use stripcast_project_model::asset::Asset;
use stripcast_project_model::strip::{StripKind, Vector3, VideoStripDescription};

use crate::media::{MediaFactory, MediaSlot};
use crate::quad::Quad;
use crate::source::EncodeSource;
use crate::strip::StripTiming;
use crate::sync::{seek_exact, PlayMode, SyncSettings};

pub struct VideoStrip {
    id: String,
    pub timing: StripTiming,
    pub position: Vector3,
    /// Seconds skipped at the head of the source media.
    pub video_offset: f64,
    pub percent: Option<f64>,
    slot: MediaSlot,
    quad: Quad,
    sync: SyncSettings,
}

impl VideoStrip {
    pub fn new(
        id: String,
        desc: &VideoStripDescription,
        asset: Option<Asset>,
        factory: &dyn MediaFactory,
        sync: SyncSettings,
    ) -> Self {
        let timing = StripTiming::from(&desc.base);
        let mut quad = Quad::new(desc.position);
        quad.place(desc.position, timing.layer);
        Self {
            id,
            timing,
            position: desc.position,
            video_offset: desc.video_offset,
            percent: desc.percent,
            slot: MediaSlot::bind(asset, factory),
            quad,
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

    pub fn quad(&self) -> &Quad {
        &self.quad
    }

    /// Media volume, or `None` without media.
    pub fn volume(&self) -> Option<f32> {
        self.slot.media().map(|m| m.volume())
    }

    fn media_time(&self, time: f64) -> f64 {
        time - self.timing.start + self.video_offset
    }

    pub async fn update(
        &mut self,
        time: f64,
        delta_ms: f64,
        is_playing: bool,
        mode: PlayMode,
        fps: f64,
    ) -> StripcastResult<()> {
        self.quad.place(self.position, self.timing.layer);

        if let Some(metadata) = self.slot.poll() {
            self.quad
                .scale_to(metadata.width, metadata.height, self.percent.unwrap_or(100.0));
            tracing::debug!(
                strip = %self.id,
                width = metadata.width,
                height = metadata.height,
                "Video strip loaded"
            );
        }
        if !self.slot.is_loaded() {
            self.quad.visible = false;
            return Ok(());
        }

        let media_time = self.media_time(time);
        let active = self.timing.is_active(time);
        let reseek = is_off_frame_interval(delta_ms, fps, self.sync.fps_tolerance_ms);
        let Some(media) = self.slot.media_mut() else {
            self.quad.visible = false;
            return Ok(());
        };

        if !active {
            media.set_volume(0.0);
            if !media.is_paused() {
                media.pause();
            }
            self.quad.visible = false;
            return Ok(());
        }

        self.quad.visible = true;
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
        self.quad.texture = media.current_frame();
        Ok(())
    }

    pub fn to_description(&self) -> VideoStripDescription {
        VideoStripDescription {
            base: self.timing.to_base(&self.id, self.slot.asset()),
            position: self.position,
            video_offset: self.video_offset,
            percent: self.percent,
        }
    }

    pub fn encode_source(&self) -> Option<EncodeSource> {
        let asset = self.slot.asset().filter(|a| a.is_playable())?.clone();
        Some(EncodeSource {
            strip_id: self.id.clone(),
            kind: StripKind::Video,
            asset,
            start: self.timing.start,
            length: self.timing.length,
            video_offset: self.video_offset,
            has_audio: self.slot.metadata().map_or(true, |m| m.has_audio),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockFactory;
    use stripcast_common::error::StripcastError;
    use stripcast_project_model::asset::AssetKind;
    use stripcast_project_model::strip::StripBase;
    use std::time::Duration;

    fn clip_desc() -> VideoStripDescription {
        VideoStripDescription {
            base: StripBase::new(1.0, 2.0, 2).with_asset("clip", "/m/clip.mp4"),
            position: Vector3::new(10.0, 20.0, 0.0),
            video_offset: 0.5,
            percent: Some(50.0),
        }
    }

    fn clip_asset() -> Asset {
        Asset::new("clip", "clip.mp4", AssetKind::Video, "/m/clip.mp4")
    }

    #[tokio::test]
    async fn test_frame_exact_seek_applies_offset_once() {
        let factory = MockFactory::loaded(640, 360);
        let mut strip = VideoStrip::new(
            "v1".into(),
            &clip_desc(),
            Some(clip_asset()),
            &factory,
            SyncSettings::default(),
        );

        strip
            .update(1.5, 1000.0 / 30.0, false, PlayMode::FrameExact, 30.0)
            .await
            .unwrap();

        let state = factory.state("clip");
        assert_eq!(state.lock().unwrap().seeks, vec![1.0]);
        assert!(strip.quad().visible);
        assert!(strip.quad().texture.is_some());
        assert_eq!(strip.quad().position, Vector3::new(10.0, 20.0, 2.0));
        assert_eq!((strip.quad().width, strip.quad().height), (320.0, 180.0));
        assert!(strip.asset().unwrap().valid);
        assert_eq!(strip.volume(), Some(1.0));
    }

    #[tokio::test]
    async fn test_outside_window_is_hidden_and_muted() {
        let factory = MockFactory::loaded(640, 360);
        let mut strip = VideoStrip::new(
            "v1".into(),
            &clip_desc(),
            Some(clip_asset()),
            &factory,
            SyncSettings::default(),
        );

        for time in [0.5, 1.0, 3.0, 4.0] {
            strip
                .update(time, 1000.0 / 30.0, true, PlayMode::Interactive, 30.0)
                .await
                .unwrap();
            assert!(!strip.quad().visible, "visible at {time}");
            assert_eq!(strip.volume(), Some(0.0));
        }
        assert!(factory.state("clip").lock().unwrap().seeks.is_empty());
    }

    #[tokio::test]
    async fn test_interactive_reseeks_only_off_grid() {
        let factory = MockFactory::loaded(640, 360);
        let mut strip = VideoStrip::new(
            "v1".into(),
            &clip_desc(),
            Some(clip_asset()),
            &factory,
            SyncSettings::default(),
        );
        let state = factory.state("clip");

        strip
            .update(2.0, 1000.0 / 30.0, false, PlayMode::Interactive, 30.0)
            .await
            .unwrap();
        assert!(state.lock().unwrap().set_positions.is_empty());

        strip
            .update(2.0, 16.0, false, PlayMode::Interactive, 30.0)
            .await
            .unwrap();
        assert_eq!(state.lock().unwrap().set_positions, vec![1.5]);

        strip
            .update(2.1, 1000.0 / 30.0, true, PlayMode::Interactive, 30.0)
            .await
            .unwrap();
        let state = state.lock().unwrap();
        assert_eq!(state.plays, 1);
        assert!(!state.paused);
        assert!((state.set_positions[1] - 1.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unloaded_media_is_a_no_op() {
        let factory = MockFactory::unloaded();
        let mut strip = VideoStrip::new(
            "v1".into(),
            &clip_desc(),
            Some(clip_asset()),
            &factory,
            SyncSettings::default(),
        );
        strip
            .update(2.0, 16.0, true, PlayMode::FrameExact, 30.0)
            .await
            .unwrap();
        assert!(!strip.is_loaded());
        assert!(!strip.quad().visible);
        assert!(factory.state("clip").lock().unwrap().seeks.is_empty());
    }

    #[tokio::test]
    async fn test_hung_seek_times_out() {
        let mut factory = MockFactory::loaded(64, 64);
        factory.hang_seeks = true;
        let sync = SyncSettings {
            seek_timeout: Duration::from_millis(20),
            ..SyncSettings::default()
        };
        let mut strip =
            VideoStrip::new("v1".into(), &clip_desc(), Some(clip_asset()), &factory, sync);

        let err = strip
            .update(2.0, 1000.0 / 30.0, false, PlayMode::FrameExact, 30.0)
            .await
            .unwrap_err();
        match err {
            StripcastError::SeekTimeout {
                strip_id,
                timeout_ms,
                ..
            } => {
                assert_eq!(strip_id, "v1");
                assert_eq!(timeout_ms, 20);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_description_round_trip() {
        let factory = MockFactory::loaded(64, 64);
        let desc = clip_desc();
        let strip = VideoStrip::new(
            "v1".into(),
            &desc,
            Some(clip_asset()),
            &factory,
            SyncSettings::default(),
        );
        let exported = strip.to_description();
        assert_eq!(exported.base.id.as_deref(), Some("v1"));
        assert_eq!(exported.base.asset_id, "clip");
        assert_eq!(exported.base.src, "/m/clip.mp4");
        assert_eq!(exported.video_offset, 0.5);
        assert_eq!(exported.position, desc.position);
        assert_eq!(exported.percent, Some(50.0));
    }

    #[test]
    fn test_encode_source_skips_still_assets() {
        let factory = MockFactory::loaded(64, 64);
        let logo = Asset::new("clip", "logo.png", AssetKind::Image, "/m/logo.png");
        let strip =
            VideoStrip::new("v".into(), &clip_desc(), Some(logo), &factory, SyncSettings::default());
        assert!(strip.encode_source().is_none());
    }

    #[tokio::test]
    async fn test_silent_video_source_after_load() {
        let mut factory = MockFactory::loaded(64, 64);
        if let Some(metadata) = &mut factory.metadata {
            metadata.has_audio = false;
        }
        let mut strip = VideoStrip::new(
            "v1".into(),
            &clip_desc(),
            Some(clip_asset()),
            &factory,
            SyncSettings::default(),
        );
        strip
            .update(0.0, 1000.0 / 30.0, false, PlayMode::Interactive, 30.0)
            .await
            .unwrap();
        let source = strip.encode_source().unwrap();
        assert!(!source.has_audio);
        assert_eq!(source.video_offset, 0.5);
    }
}
