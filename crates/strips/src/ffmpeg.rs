//! ffmpeg/ffprobe-backed media handles.
//!
//! Metadata is probed on a background task when the handle opens. Frame-
//! exact seeks decode the single frame at the requested position with a
//! one-shot ffmpeg run; interactive playback only tracks a playhead clock.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use stripcast_common::clock::PlaybackClock;
use stripcast_common::config::EncodingDefaults;
use stripcast_common::error::{StripcastError, StripcastResult};
use stripcast_project_model::asset::{Asset, AssetKind};
use tokio::process::Command;
use tokio::sync::watch;

use crate::media::{Frame, MediaFactory, MediaHandle, MediaMetadata};

/// Opens [`FfmpegMedia`] handles using configured engine binaries.
#[derive(Debug, Clone)]
pub struct FfmpegMediaFactory {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegMediaFactory {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    pub fn from_config(encoding: &EncodingDefaults) -> Self {
        Self::new(&encoding.ffmpeg_path, &encoding.ffprobe_path)
    }
}

impl MediaFactory for FfmpegMediaFactory {
    fn open(&self, asset: &Asset) -> Box<dyn MediaHandle> {
        Box::new(FfmpegMedia::open(asset, &self.ffmpeg, &self.ffprobe))
    }
}

pub struct FfmpegMedia {
    path: PathBuf,
    kind: AssetKind,
    ffmpeg: PathBuf,
    metadata_rx: watch::Receiver<Option<MediaMetadata>>,
    poster_rx: watch::Receiver<Option<Arc<Frame>>>,
    clock: PlaybackClock,
    volume: f32,
    frame: Option<Arc<Frame>>,
}

impl FfmpegMedia {
    /// Open `asset` and start probing it in the background.
    ///
    /// Without a tokio runtime the probe cannot run and the media never
    /// reports metadata.
    pub fn open(asset: &Asset, ffmpeg: &Path, ffprobe: &Path) -> Self {
        let (metadata_tx, metadata_rx) = watch::channel(None);
        let (poster_tx, poster_rx) = watch::channel(None);
        let path = PathBuf::from(&asset.path);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let kind = asset.kind;
                let probe_path = path.clone();
                let ffmpeg = ffmpeg.to_path_buf();
                let ffprobe = ffprobe.to_path_buf();
                let asset_id = asset.id.clone();
                handle.spawn(async move {
                    let metadata = match probe_media(&ffprobe, &probe_path).await {
                        Ok(metadata) => metadata,
                        Err(e) => {
                            tracing::warn!(asset = %asset_id, error = %e, "Media probe failed");
                            return;
                        }
                    };
                    if kind == AssetKind::Image {
                        match decode_frame(&ffmpeg, &probe_path, None, metadata.width, metadata.height)
                            .await
                        {
                            Ok(Some(frame)) => {
                                poster_tx.send_replace(Some(Arc::new(frame)));
                            }
                            Ok(None) => {}
                            Err(e) => {
                                tracing::warn!(asset = %asset_id, error = %e, "Image decode failed");
                                return;
                            }
                        }
                    }
                    tracing::debug!(asset = %asset_id, ?metadata, "Media probed");
                    metadata_tx.send_replace(Some(metadata));
                });
            }
            Err(_) => {
                tracing::warn!(asset = %asset.id, "No async runtime; media will not load");
            }
        }

        Self {
            path,
            kind: asset.kind,
            ffmpeg: ffmpeg.to_path_buf(),
            metadata_rx,
            poster_rx,
            clock: PlaybackClock::new(),
            volume: 1.0,
            frame: None,
        }
    }
}

#[async_trait]
impl MediaHandle for FfmpegMedia {
    fn metadata(&self) -> watch::Receiver<Option<MediaMetadata>> {
        self.metadata_rx.clone()
    }

    fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    fn play(&mut self) {
        self.clock.play();
    }

    fn pause(&mut self) {
        self.clock.pause();
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn position_secs(&self) -> f64 {
        self.clock.position_secs()
    }

    fn set_position(&mut self, secs: f64) {
        self.clock.set_position(secs);
    }

    async fn seek(&mut self, secs: f64) -> StripcastResult<()> {
        self.clock.set_position(secs);
        if self.kind != AssetKind::Video {
            return Ok(());
        }
        let metadata = *self.metadata_rx.borrow();
        let Some(metadata) = metadata else {
            return Ok(());
        };
        // Past the last frame ffmpeg emits nothing; keep the previous picture.
        if let Some(frame) = decode_frame(
            &self.ffmpeg,
            &self.path,
            Some(secs),
            metadata.width,
            metadata.height,
        )
        .await?
        {
            self.frame = Some(Arc::new(frame));
        }
        Ok(())
    }

    fn current_frame(&self) -> Option<Arc<Frame>> {
        self.frame
            .clone()
            .or_else(|| self.poster_rx.borrow().clone())
    }
}

/// Probe stream layout and duration with ffprobe.
pub async fn probe_media(ffprobe: &Path, path: &Path) -> StripcastResult<MediaMetadata> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "stream=codec_type,width,height:format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| StripcastError::capture(format!("Failed to start ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(StripcastError::capture(format!(
            "ffprobe failed on {} (status {}): {}",
            path.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    parse_probe_output(&output.stdout)
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

fn parse_probe_output(bytes: &[u8]) -> StripcastResult<MediaMetadata> {
    let probe: ProbeOutput = serde_json::from_slice(bytes)?;
    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));
    let duration_secs = probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(MediaMetadata {
        width: video.and_then(|s| s.width).unwrap_or(0),
        height: video.and_then(|s| s.height).unwrap_or(0),
        duration_secs,
        has_audio,
    })
}

/// Decode one RGBA frame, at `secs` when given. `Ok(None)` when ffmpeg
/// produced no picture.
async fn decode_frame(
    ffmpeg: &Path,
    path: &Path,
    secs: Option<f64>,
    width: u32,
    height: u32,
) -> StripcastResult<Option<Frame>> {
    let mut cmd = Command::new(ffmpeg);
    cmd.args(["-v", "error"]);
    if let Some(secs) = secs {
        cmd.arg("-ss").arg(format!("{secs:.6}"));
    }
    let output = cmd
        .arg("-i")
        .arg(path)
        .args(["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgba", "-"])
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| StripcastError::capture(format!("Failed to start ffmpeg: {e}")))?;

    if !output.status.success() {
        return Err(StripcastError::capture(format!(
            "Frame decode failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    if output.stdout.is_empty() {
        return Ok(None);
    }
    Frame::from_rgba(width, height, output.stdout)
        .map(Some)
        .ok_or_else(|| {
            StripcastError::capture(format!(
                "Decoded frame of {} does not match {width}x{height}",
                path.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_with_audio() {
        let json = br#"{
            "programs": [],
            "streams": [
                {"codec_type": "video", "width": 1920, "height": 1080},
                {"codec_type": "audio"}
            ],
            "format": {"duration": "12.480000"}
        }"#;
        let metadata = parse_probe_output(json).unwrap();
        assert_eq!((metadata.width, metadata.height), (1920, 1080));
        assert!(metadata.has_audio);
        assert!((metadata.duration_secs - 12.48).abs() < 1e-9);
    }

    #[test]
    fn test_parse_probe_still_image() {
        let json = br#"{"streams": [{"codec_type": "video", "width": 64, "height": 32}],
                        "format": {"duration": "N/A"}}"#;
        let metadata = parse_probe_output(json).unwrap();
        assert!(!metadata.has_audio);
        assert_eq!(metadata.duration_secs, 0.0);
        assert_eq!(metadata.width, 64);
    }

    #[test]
    fn test_parse_probe_rejects_garbage() {
        assert!(parse_probe_output(b"not json").is_err());
    }

    #[test]
    fn test_open_without_runtime_stays_unloaded() {
        let asset = Asset::new("a", "a.mp4", AssetKind::Video, "/nonexistent/a.mp4");
        let media = FfmpegMedia::open(&asset, Path::new("ffmpeg"), Path::new("ffprobe"));
        assert!(media.metadata().borrow().is_none());
        assert!(media.is_paused());
        assert!(media.current_frame().is_none());
    }

    #[tokio::test]
    async fn test_playhead_follows_set_position() {
        let asset = Asset::new("a", "a.wav", AssetKind::Audio, "/nonexistent/a.wav");
        let mut media = FfmpegMedia::open(
            &asset,
            Path::new("stripcast-missing-ffmpeg"),
            Path::new("stripcast-missing-ffprobe"),
        );
        media.set_position(2.0);
        assert_eq!(media.position_secs(), 2.0);
        media.seek(3.5).await.unwrap();
        assert_eq!(media.position_secs(), 3.5);
        media.set_volume(4.0);
        assert_eq!(media.volume(), 1.0);
    }
}
