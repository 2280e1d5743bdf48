//! Process-backed ffmpeg engine.
//!
//! Each invocation runs the ffmpeg binary with the scratch directory as its
//! working directory, so plan arguments can use bare scratch file names.
//! Progress comes from `-progress pipe:1` key/value lines on stdout;
//! stderr lines are forwarded as log events.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use stripcast_common::cancel::CancelToken;
use stripcast_common::config::AppConfig;
use stripcast_common::error::{StripcastError, StripcastResult};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::engine::{EncodingEngine, EngineEvent};

/// stderr lines kept for failure messages.
const STDERR_TAIL_LINES: usize = 20;

pub struct FfmpegEngine {
    ffmpeg: PathBuf,
    scratch_dir: PathBuf,
    invocations: u64,
}

impl FfmpegEngine {
    /// Create the engine and its scratch directory.
    pub async fn new(
        ffmpeg: impl Into<PathBuf>,
        scratch_dir: impl Into<PathBuf>,
    ) -> StripcastResult<Self> {
        let scratch_dir = scratch_dir.into();
        tokio::fs::create_dir_all(&scratch_dir).await.map_err(|e| {
            StripcastError::engine(format!(
                "Failed to create scratch directory {}: {e}",
                scratch_dir.display()
            ))
        })?;
        tracing::debug!(scratch = %scratch_dir.display(), "ffmpeg engine ready");
        Ok(Self {
            ffmpeg: ffmpeg.into(),
            scratch_dir,
            invocations: 0,
        })
    }

    pub async fn from_config(config: &AppConfig) -> StripcastResult<Self> {
        Self::new(&config.encoding.ffmpeg_path, &config.scratch_dir).await
    }

    /// Whether the configured binary can be started.
    pub async fn is_available(ffmpeg: &Path) -> bool {
        Command::new(ffmpeg)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    fn scratch_path(&self, name: &str) -> StripcastResult<PathBuf> {
        let relative = Path::new(name);
        if relative.is_absolute() || relative.components().count() != 1 {
            return Err(StripcastError::engine(format!(
                "Scratch file name must be a bare file name: {name}"
            )));
        }
        Ok(self.scratch_dir.join(relative))
    }
}

#[async_trait]
impl EncodingEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn write_file(&mut self, name: &str, data: &[u8]) -> StripcastResult<()> {
        let path = self.scratch_path(name)?;
        tokio::fs::write(&path, data).await?;
        tracing::trace!(file = name, bytes = data.len(), "Wrote scratch file");
        Ok(())
    }

    async fn read_file(&mut self, name: &str) -> StripcastResult<Vec<u8>> {
        let path = self.scratch_path(name)?;
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StripcastError::FileNotFound { path }
            } else {
                StripcastError::Io(e)
            }
        })
    }

    async fn remove_file(&mut self, name: &str) -> StripcastResult<()> {
        let path = self.scratch_path(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn run(
        &mut self,
        args: &[String],
        on_event: &mut (dyn FnMut(EngineEvent) + Send),
        cancel: &CancelToken,
    ) -> StripcastResult<()> {
        self.invocations += 1;
        tracing::debug!(invocation = self.invocations, ?args, "Running ffmpeg");

        let mut child = Command::new(&self.ffmpeg)
            .current_dir(&self.scratch_dir)
            .args(["-hide_banner", "-nostats", "-progress", "pipe:1"])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| StripcastError::engine(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(
            pid = child.id(),
            invocation = self.invocations,
            args_len = args.len(),
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| StripcastError::engine("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| StripcastError::engine("Failed to capture ffmpeg stderr"))?;
        let mut progress_lines = BufReader::new(stdout).lines();
        let mut log_lines = BufReader::new(stderr).lines();

        let mut progress = ProgressState::default();
        let mut stderr_tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
        let (mut stdout_done, mut stderr_done) = (false, false);

        while !(stdout_done && stderr_done) {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(invocation = self.invocations, "Killing ffmpeg on cancel");
                    // Exit status of a killed process carries no information.
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    return Err(StripcastError::Cancelled);
                }
                line = progress_lines.next_line(), if !stdout_done => match line {
                    Ok(Some(line)) => {
                        if let Some((key, value)) = line.trim().split_once('=') {
                            if let Some(elapsed_secs) = progress.update(key, value) {
                                on_event(EngineEvent::Progress { elapsed_secs });
                            }
                        }
                    }
                    Ok(None) => stdout_done = true,
                    Err(e) => {
                        return Err(StripcastError::engine(format!(
                            "Failed reading ffmpeg progress: {e}"
                        )));
                    }
                },
                line = log_lines.next_line(), if !stderr_done => match line {
                    Ok(Some(line)) => {
                        if stderr_tail.len() == STDERR_TAIL_LINES {
                            stderr_tail.pop_front();
                        }
                        stderr_tail.push_back(line.clone());
                        on_event(EngineEvent::Log(line));
                    }
                    Ok(None) => stderr_done = true,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed reading ffmpeg stderr");
                        stderr_done = true;
                    }
                },
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| StripcastError::engine(format!("Failed to wait on ffmpeg: {e}")))?;

        if !status.success() {
            let tail: Vec<String> = stderr_tail.into_iter().collect();
            return Err(StripcastError::engine(format!(
                "ffmpeg failed (status {status}): {}",
                tail.join("\n").trim()
            )));
        }
        Ok(())
    }

    async fn shutdown(&mut self) -> StripcastResult<()> {
        // Leaves the directory alone if anything outside the registry is still in it.
        match tokio::fs::remove_dir(&self.scratch_dir).await {
            Ok(()) => tracing::debug!(scratch = %self.scratch_dir.display(), "Removed scratch directory"),
            Err(e) => tracing::debug!(error = %e, "Scratch directory kept"),
        }
        Ok(())
    }
}

/// Accumulates `-progress` key/value lines.
#[derive(Debug, Default, Clone, Copy)]
struct ProgressState {
    out_time_secs: f64,
}

impl ProgressState {
    /// Returns the encoded time when `key` closes a block, including the
    /// final `progress=end` block.
    fn update(&mut self, key: &str, value: &str) -> Option<f64> {
        match key {
            // ffmpeg reports microseconds under both keys.
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
                None
            }
            "progress" => Some(self.out_time_secs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_state_parses_microseconds() {
        let mut state = ProgressState::default();
        assert_eq!(state.update("frame", "42"), None);
        assert_eq!(state.update("out_time_us", "1500000"), None);
        assert_eq!(state.out_time_secs, 1.5);
        state.update("out_time_ms", "2500000");
        assert_eq!(state.out_time_secs, 2.5);
        state.update("out_time_us", "N/A");
        assert_eq!(state.out_time_secs, 2.5);
    }

    #[test]
    fn test_every_progress_block_reports_time() {
        let mut state = ProgressState::default();
        let lines = [
            "out_time_us=1000000",
            "progress=continue",
            "out_time_us=3000000",
            "progress=end",
        ];
        let reported: Vec<f64> = lines
            .iter()
            .filter_map(|line| line.split_once('='))
            .filter_map(|(key, value)| state.update(key, value))
            .collect();
        assert_eq!(reported, vec![1.0, 3.0]);
    }

    #[tokio::test]
    async fn test_scratch_files_round_trip() {
        let dir = std::env::temp_dir().join("stripcast_test_ffmpeg_scratch");
        let mut engine = FfmpegEngine::new("ffmpeg", &dir).await.unwrap();

        engine.write_file("a.bin", b"abc").await.unwrap();
        assert_eq!(engine.read_file("a.bin").await.unwrap(), b"abc");
        engine.remove_file("a.bin").await.unwrap();
        engine.remove_file("a.bin").await.unwrap();
        assert!(matches!(
            engine.read_file("a.bin").await,
            Err(StripcastError::FileNotFound { .. })
        ));
        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_scratch_names_cannot_escape() {
        let dir = std::env::temp_dir().join("stripcast_test_ffmpeg_escape");
        let mut engine = FfmpegEngine::new("ffmpeg", &dir).await.unwrap();
        assert!(engine.write_file("../evil", b"x").await.is_err());
        assert!(engine.write_file("/tmp/evil", b"x").await.is_err());
        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_binary_is_engine_error() {
        let dir = std::env::temp_dir().join("stripcast_test_ffmpeg_missing");
        let mut engine = FfmpegEngine::new("stripcast-no-such-ffmpeg", &dir)
            .await
            .unwrap();
        let mut events = Vec::new();
        let err = engine
            .run(&["-version".to_string()], &mut |e| events.push(e), &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StripcastError::EngineInvocation { .. }));
        assert!(!FfmpegEngine::is_available(Path::new("stripcast-no-such-ffmpeg")).await);
        engine.shutdown().await.unwrap();
    }
}
