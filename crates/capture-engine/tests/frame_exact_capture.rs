//! Capture runs against scripted media handles.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use stripcast_capture_engine::{FlatCompositor, Recorder, RecorderState, Y4mSink};
use stripcast_common::error::{StripcastError, StripcastResult};
use stripcast_project_model::asset::{Asset, AssetKind};
use stripcast_project_model::strip::StripDescription;
use stripcast_strips::media::{Frame, MediaFactory, MediaHandle, MediaMetadata};
use stripcast_strips::strip::build_strips;
use stripcast_strips::sync::SyncSettings;
use tokio::sync::watch;

/// Records every confirmed seek; optionally never confirms.
struct ScriptedMedia {
    seeks: Arc<Mutex<Vec<f64>>>,
    hang: bool,
    paused: bool,
    metadata: watch::Receiver<Option<MediaMetadata>>,
    _metadata_tx: watch::Sender<Option<MediaMetadata>>,
}

#[async_trait]
impl MediaHandle for ScriptedMedia {
    fn metadata(&self) -> watch::Receiver<Option<MediaMetadata>> {
        self.metadata.clone()
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
        self.seeks.lock().unwrap().last().copied().unwrap_or(0.0)
    }
    fn set_position(&mut self, _secs: f64) {}
    async fn seek(&mut self, secs: f64) -> StripcastResult<()> {
        if self.hang {
            return std::future::pending().await;
        }
        self.seeks.lock().unwrap().push(secs);
        Ok(())
    }
    fn current_frame(&self) -> Option<Arc<Frame>> {
        Some(Arc::new(Frame::solid(2, 2, [0, 255, 0, 255])))
    }
}

struct ScriptedFactory {
    seeks: Arc<Mutex<Vec<f64>>>,
    hang: bool,
}

impl MediaFactory for ScriptedFactory {
    fn open(&self, _asset: &Asset) -> Box<dyn MediaHandle> {
        let (tx, rx) = watch::channel(Some(MediaMetadata {
            width: 2,
            height: 2,
            duration_secs: 5.0,
            has_audio: true,
        }));
        Box::new(ScriptedMedia {
            seeks: self.seeks.clone(),
            hang: self.hang,
            paused: true,
            metadata: rx,
            _metadata_tx: tx,
        })
    }
}

fn video_project() -> (Vec<StripDescription>, Vec<Asset>) {
    let descs = serde_json::from_value(serde_json::json!([
        {"type": "Video", "id": "clip", "start": 0.0, "length": 1.0, "layer": 0,
         "assetId": "a", "videoOffset": 2.0}
    ]))
    .unwrap();
    (descs, vec![Asset::new("a", "a.mp4", AssetKind::Video, "/m/a.mp4")])
}

#[tokio::test]
async fn frame_exact_capture_seeks_every_active_frame() {
    let seeks = Arc::new(Mutex::new(Vec::new()));
    let factory = ScriptedFactory {
        seeks: seeks.clone(),
        hang: false,
    };
    let (descs, assets) = video_project();
    let strips = build_strips(&descs, &assets, &factory, SyncSettings::default());

    let mut recorder = Recorder::new(
        Box::new(FlatCompositor::new(2, 2)),
        Box::new(Y4mSink::new()),
        4.0,
        4,
        strips,
    );
    recorder.start().await.unwrap();

    // t = 0 is outside the open window; t = 0.25, 0.5, 0.75 are inside.
    assert_eq!(*seeks.lock().unwrap(), vec![2.25, 2.5, 2.75]);
}

#[tokio::test]
async fn seek_timeout_aborts_capture() {
    let factory = ScriptedFactory {
        seeks: Arc::new(Mutex::new(Vec::new())),
        hang: true,
    };
    let (descs, assets) = video_project();
    let sync = SyncSettings {
        seek_timeout: Duration::from_millis(25),
        ..SyncSettings::default()
    };
    let strips = build_strips(&descs, &assets, &factory, sync);

    let progress = Arc::new(Mutex::new(Vec::new()));
    let progress_cb = progress.clone();
    let mut recorder = Recorder::new(
        Box::new(FlatCompositor::new(2, 2)),
        Box::new(Y4mSink::new()),
        4.0,
        4,
        strips,
    )
    .with_progress(move |r| progress_cb.lock().unwrap().push(r));

    let err = recorder.start().await.unwrap_err();
    assert!(matches!(err, StripcastError::SeekTimeout { ref strip_id, .. } if strip_id == "clip"));
    assert_eq!(recorder.state(), RecorderState::Idle);
    // Frame 1 (t = 0) completes before the strip becomes active.
    assert_eq!(*progress.lock().unwrap(), vec![0.25]);
}
