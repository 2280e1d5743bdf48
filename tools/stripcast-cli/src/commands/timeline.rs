//! Shared strip loading for `render` and `plan`.

use std::time::Duration;

use stripcast_common::config::AppConfig;
use stripcast_project_model::Project;
use stripcast_render_engine::EncodeSettings;
use stripcast_strips::{build_strips, wait_for_media, MediaFactory, Strip, SyncSettings};

/// How long strips may take to probe their media.
pub(crate) const MEDIA_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the project's strips and wait for their media, so that audio
/// layout and sizes come from the probed files.
pub(crate) async fn load_strips(
    project: &Project,
    config: &AppConfig,
    factory: &dyn MediaFactory,
    timeout: Duration,
) -> anyhow::Result<Vec<Strip>> {
    let mut strips = build_strips(
        &project.strips,
        &project.assets,
        factory,
        SyncSettings::from(&config.sync),
    );
    let pending = wait_for_media(&mut strips, project.fps, timeout).await?;
    for id in &pending {
        tracing::warn!(strip = %id, "Media did not load; strip will render blank");
    }
    Ok(strips)
}

pub(crate) fn encode_settings(project: &Project, config: &AppConfig) -> EncodeSettings {
    EncodeSettings::with_codecs(
        project.width,
        project.height,
        project.fps,
        project.duration,
        &config.encoding,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use stripcast_common::error::StripcastResult;
    use stripcast_project_model::asset::{Asset, AssetKind};
    use stripcast_project_model::strip::{StripBase, StripDescription, Vector3, VideoStripDescription};
    use stripcast_render_engine::EncodePlan;
    use stripcast_strips::{Frame, MediaHandle, MediaMetadata};
    use tokio::sync::watch;

    /// Media that reports a silent video stream as soon as it is opened.
    struct SilentMedia {
        _tx: watch::Sender<Option<MediaMetadata>>,
        rx: watch::Receiver<Option<MediaMetadata>>,
        paused: bool,
    }

    #[async_trait]
    impl MediaHandle for SilentMedia {
        fn metadata(&self) -> watch::Receiver<Option<MediaMetadata>> {
            self.rx.clone()
        }
        fn is_paused(&self) -> bool {
            self.paused
        }
        fn play(&mut self) {
            self.paused = false;
        }
        fn pause(&mut self) {
            self.paused = true;
        }
        fn volume(&self) -> f32 {
            1.0
        }
        fn set_volume(&mut self, _volume: f32) {}
        fn position_secs(&self) -> f64 {
            0.0
        }
        fn set_position(&mut self, _secs: f64) {}
        async fn seek(&mut self, _secs: f64) -> StripcastResult<()> {
            Ok(())
        }
        fn current_frame(&self) -> Option<Arc<Frame>> {
            None
        }
    }

    struct SilentFactory;

    impl MediaFactory for SilentFactory {
        fn open(&self, _asset: &Asset) -> Box<dyn MediaHandle> {
            let (tx, rx) = watch::channel(Some(MediaMetadata {
                width: 64,
                height: 64,
                duration_secs: 5.0,
                has_audio: false,
            }));
            Box::new(SilentMedia {
                _tx: tx,
                rx,
                paused: true,
            })
        }
    }

    fn silent_video_project() -> Project {
        let mut project = Project::new("Silent", 64, 64, 10.0, 2.0);
        project
            .assets
            .push(Asset::new("clip", "clip.mp4", AssetKind::Video, "/m/clip.mp4"));
        project
            .strips
            .push(StripDescription::Video(VideoStripDescription {
                base: StripBase::new(0.5, 1.0, 0)
                    .with_id("v")
                    .with_asset("clip", "/m/clip.mp4"),
                position: Vector3::new(0.0, 0.0, 0.0),
                video_offset: 0.0,
                percent: None,
            }));
        project
    }

    #[tokio::test]
    async fn test_silent_video_gets_no_audio_graph() {
        let project = silent_video_project();
        let config = AppConfig::default();
        let strips = load_strips(&project, &config, &SilentFactory, Duration::from_secs(1))
            .await
            .unwrap();
        let sources: Vec<_> = strips.iter().filter_map(Strip::encode_source).collect();
        assert_eq!(sources.len(), 1);
        assert!(!sources[0].has_audio);

        let plan = EncodePlan::new(&encode_settings(&project, &config), &sources);
        assert_eq!(plan.preparation.len(), 1);
        assert!(!plan.main.iter().any(|a| a == "-filter_complex"));
        assert!(!plan.main.iter().any(|a| a == "-c:a"));
    }
}
