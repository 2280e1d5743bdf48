//! Two-phase encode driver.
//!
//! Phase 1 copies every media asset into scratch and trims it to its strip.
//! Phase 2 runs the main encode that mixes the trimmed audio under the raw
//! capture. Both phases run strictly one after the other, one engine
//! invocation at a time.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use stripcast_common::cancel::CancelToken;
use stripcast_common::error::{StripcastError, StripcastResult};
use stripcast_strips::source::EncodeSource;
use stripcast_strips::strip::Strip;

use crate::engine::{EncodingEngine, EngineEvent};
use crate::export::ExportSink;
use crate::plan::{EncodePlan, EncodeSettings, CAPTURE_FILE_NAME, OUTPUT_FILE_NAME};
use crate::scratch::ScratchRegistry;

/// Ratio callback, `[0, 1]` for preparation, `>= 0` for the main encode.
pub type RatioCallback = Box<dyn FnMut(f64) + Send>;

/// Outcome of one encode phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhaseStatus {
    Completed,
    /// The phase could not run, e.g. no engine was available.
    Skipped { reason: String },
    Cancelled,
    /// An earlier phase stopped the encode first.
    NotRun,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodeReport {
    pub preparation: PhaseStatus,
    pub main: PhaseStatus,
    /// Media tracks extracted in phase 1.
    pub prepared_tracks: usize,
}

impl EncodeReport {
    fn not_run() -> Self {
        Self {
            preparation: PhaseStatus::NotRun,
            main: PhaseStatus::NotRun,
            prepared_tracks: 0,
        }
    }

    fn skipped(reason: &str) -> Self {
        Self {
            preparation: PhaseStatus::Skipped {
                reason: reason.to_string(),
            },
            main: PhaseStatus::Skipped {
                reason: reason.to_string(),
            },
            prepared_tracks: 0,
        }
    }

    /// Whether `out.mp4` was produced.
    pub fn is_complete(&self) -> bool {
        self.main == PhaseStatus::Completed
    }
}

/// Timestamped log lines, most recent first.
#[derive(Debug, Clone, Default)]
pub struct EncodeLog {
    entries: VecDeque<String>,
}

impl EncodeLog {
    pub fn push(&mut self, message: impl AsRef<str>) {
        self.push_at(Utc::now(), message);
    }

    /// Record `message` as `[YYYY-MM-DD HH:MM:SS.ffff] message`.
    pub fn push_at(&mut self, at: DateTime<Utc>, message: impl AsRef<str>) {
        self.entries.push_front(format!(
            "[{}.{:04}] {}",
            at.format("%Y-%m-%d %H:%M:%S"),
            at.timestamp_subsec_micros() / 100,
            message.as_ref()
        ));
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.front().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Drives an [`EncodingEngine`] through asset preparation and the main
/// encode, owning every scratch file it creates.
pub struct Encoder {
    settings: EncodeSettings,
    sources: Vec<EncodeSource>,
    engine: Option<Box<dyn EncodingEngine>>,
    registry: ScratchRegistry,
    log: EncodeLog,
    cancel: CancelToken,
    is_encoding: bool,
    progress: f64,
    on_progress: Option<RatioCallback>,
    on_preparation_progress: Option<RatioCallback>,
}

impl Encoder {
    /// Encoder over the media-bearing strips of `strips`.
    pub fn new(
        settings: EncodeSettings,
        strips: &[Strip],
        engine: Option<Box<dyn EncodingEngine>>,
    ) -> Self {
        let sources = strips.iter().filter_map(Strip::encode_source).collect();
        Self::from_sources(settings, sources, engine)
    }

    pub fn from_sources(
        settings: EncodeSettings,
        sources: Vec<EncodeSource>,
        engine: Option<Box<dyn EncodingEngine>>,
    ) -> Self {
        Self {
            settings,
            sources,
            engine,
            registry: ScratchRegistry::new(),
            log: EncodeLog::default(),
            cancel: CancelToken::new(),
            is_encoding: false,
            progress: 0.0,
            on_progress: None,
            on_preparation_progress: None,
        }
    }

    pub fn with_progress(mut self, callback: impl FnMut(f64) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    pub fn with_preparation_progress(
        mut self,
        callback: impl FnMut(f64) + Send + 'static,
    ) -> Self {
        self.on_preparation_progress = Some(Box::new(callback));
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn settings(&self) -> &EncodeSettings {
        &self.settings
    }

    pub fn sources(&self) -> &[EncodeSource] {
        &self.sources
    }

    /// The invocations an encode would run.
    pub fn plan(&self) -> EncodePlan {
        EncodePlan::new(&self.settings, &self.sources)
    }

    pub fn is_encoding(&self) -> bool {
        self.is_encoding
    }

    /// Last main-encode progress ratio.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn log(&self) -> &EncodeLog {
        &self.log
    }

    pub fn registry(&self) -> &ScratchRegistry {
        &self.registry
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Encode `raw_capture` into `out.mp4` in the engine's scratch space.
    ///
    /// Without an engine both phases report [`PhaseStatus::Skipped`]. A
    /// cancellation observed mid-encode is not an error: the report marks the
    /// interrupted phase as cancelled and the engine is released.
    pub async fn encode(&mut self, raw_capture: &[u8]) -> StripcastResult<EncodeReport> {
        if self.cancel.is_cancelled() {
            return Err(StripcastError::Cancelled);
        }
        let Some(mut engine) = self.engine.take() else {
            let reason = "no encoding engine available";
            tracing::warn!(reason, "Skipping encode");
            self.log.push(format!("Skipped encode: {reason}"));
            return Ok(EncodeReport::skipped(reason));
        };

        let plan = self.plan();
        tracing::info!(
            engine = engine.name(),
            media_tracks = self.sources.len(),
            frames = self.settings.frames(),
            capture_bytes = raw_capture.len(),
            "Starting encode"
        );
        self.is_encoding = true;
        self.progress = 0.0;

        let mut report = EncodeReport::not_run();
        let result = self
            .run_phases(engine.as_mut(), &plan, raw_capture, &mut report)
            .await;
        self.is_encoding = false;

        match result {
            Ok(()) => {
                self.clear_scratch(engine.as_mut(), Some(OUTPUT_FILE_NAME))
                    .await;
                self.engine = Some(engine);
                tracing::info!(prepared = report.prepared_tracks, "Encode complete");
                Ok(report)
            }
            Err(e) if self.cancel.is_cancelled() => {
                tracing::info!(error = %e, "Encode cancelled");
                self.log.push("Encode cancelled");
                if report.preparation == PhaseStatus::NotRun {
                    report.preparation = PhaseStatus::Cancelled;
                } else {
                    report.main = PhaseStatus::Cancelled;
                }
                self.release(engine).await;
                Ok(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "Encode failed");
                self.log.push(format!("Encode failed: {e}"));
                self.clear_scratch(engine.as_mut(), None).await;
                self.engine = Some(engine);
                Err(e)
            }
        }
    }

    async fn run_phases(
        &mut self,
        engine: &mut dyn EncodingEngine,
        plan: &EncodePlan,
        raw_capture: &[u8],
        report: &mut EncodeReport,
    ) -> StripcastResult<()> {
        write_scratch(engine, &mut self.registry, CAPTURE_FILE_NAME, raw_capture).await?;

        let total = plan.preparation.len();
        for (index, (step, source)) in plan.preparation.iter().zip(&self.sources).enumerate() {
            if self.cancel.is_cancelled() {
                return Err(StripcastError::Cancelled);
            }
            tracing::debug!(strip = %step.strip_id, asset = %source.asset.id, "Preparing media track");

            let data = engine.fetch_asset(&source.asset).await?;
            write_scratch(engine, &mut self.registry, &step.asset_file, &data).await?;
            drop(data);

            self.registry.register(step.output_file.clone());
            let log = &mut self.log;
            engine
                .run(
                    &step.args,
                    &mut |event| {
                        if let EngineEvent::Log(line) = event {
                            log.push(line);
                        }
                    },
                    &self.cancel,
                )
                .await?;
            remove_scratch(engine, &mut self.registry, &step.asset_file).await;

            report.prepared_tracks = index + 1;
            let ratio = (index + 1) as f64 / total as f64;
            if let Some(cb) = &mut self.on_preparation_progress {
                cb(ratio);
            }
        }
        report.preparation = PhaseStatus::Completed;

        if self.cancel.is_cancelled() {
            return Err(StripcastError::Cancelled);
        }
        self.registry.register(OUTPUT_FILE_NAME);
        let duration = self.settings.duration;
        let log = &mut self.log;
        let progress = &mut self.progress;
        let on_progress = &mut self.on_progress;
        engine
            .run(
                &plan.main,
                &mut |event| match event {
                    EngineEvent::Progress { elapsed_secs } => {
                        let ratio = if duration > 0.0 {
                            (elapsed_secs / duration).max(0.0)
                        } else {
                            0.0
                        };
                        *progress = ratio;
                        if let Some(cb) = on_progress.as_mut() {
                            cb(ratio);
                        }
                    }
                    EngineEvent::Log(line) => log.push(line),
                },
                &self.cancel,
            )
            .await?;
        report.main = PhaseStatus::Completed;
        Ok(())
    }

    /// Remove every registered scratch file except `keep`.
    async fn clear_scratch(&mut self, engine: &mut dyn EncodingEngine, keep: Option<&str>) {
        for name in self.registry.drain() {
            if keep == Some(name.as_str()) {
                self.registry.register(name);
                continue;
            }
            if let Err(e) = engine.remove_file(&name).await {
                tracing::warn!(file = %name, error = %e, "Failed to remove scratch file");
            }
        }
    }

    async fn release(&mut self, mut engine: Box<dyn EncodingEngine>) {
        self.clear_scratch(engine.as_mut(), None).await;
        if let Err(e) = engine.shutdown().await {
            tracing::debug!(error = %e, "Engine shutdown failed");
        }
    }

    /// Halt the running encode, clear scratch, and release the engine.
    ///
    /// The encoder cannot encode again afterwards.
    pub async fn cancel(&mut self) {
        self.cancel.cancel();
        self.is_encoding = false;
        match self.engine.take() {
            Some(engine) => self.release(engine).await,
            None => {
                self.registry.drain();
            }
        }
    }

    /// Read `out.mp4` back, hand it to `sink`, and remove the scratch copy.
    pub async fn download_output(&mut self, sink: &mut dyn ExportSink) -> StripcastResult<()> {
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| StripcastError::export("Fail Export: no encoding engine"))?;
        let data = engine
            .read_file(OUTPUT_FILE_NAME)
            .await
            .map_err(|e| StripcastError::export(format!("Fail Export {e}")))?;
        sink.export(OUTPUT_FILE_NAME, &data).await?;
        remove_scratch(engine.as_mut(), &mut self.registry, OUTPUT_FILE_NAME).await;
        Ok(())
    }

    /// Clear scratch and shut the engine down.
    pub async fn close(mut self) {
        if let Some(engine) = self.engine.take() {
            self.release(engine).await;
        }
    }
}

async fn write_scratch(
    engine: &mut dyn EncodingEngine,
    registry: &mut ScratchRegistry,
    name: &str,
    data: &[u8],
) -> StripcastResult<()> {
    engine.write_file(name, data).await?;
    registry.register(name);
    Ok(())
}

/// No-op for names the registry does not hold.
async fn remove_scratch(engine: &mut dyn EncodingEngine, registry: &mut ScratchRegistry, name: &str) {
    if !registry.unregister(name) {
        return;
    }
    if let Err(e) = engine.remove_file(name).await {
        tracing::warn!(file = name, error = %e, "Failed to remove scratch file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_log_is_most_recent_first_with_timestamp() {
        let mut log = EncodeLog::default();
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
            + chrono::Duration::microseconds(123_456);
        log.push_at(at, "first");
        log.push_at(at, "second");
        let entries: Vec<_> = log.entries().collect();
        assert_eq!(
            entries,
            vec![
                "[2024-03-09 07:05:01.1234] second",
                "[2024-03-09 07:05:01.1234] first"
            ]
        );
        assert_eq!(log.latest(), Some(entries[0]));
    }

    #[tokio::test]
    async fn test_missing_engine_skips_both_phases() {
        let mut encoder =
            Encoder::from_sources(EncodeSettings::new(16, 16, 30.0, 1.0), vec![], None);
        let report = encoder.encode(b"raw").await.unwrap();
        assert!(matches!(report.preparation, PhaseStatus::Skipped { .. }));
        assert!(matches!(report.main, PhaseStatus::Skipped { .. }));
        assert!(!report.is_complete());
        assert!(encoder.registry().is_empty());
        assert!(encoder.log().latest().unwrap().contains("Skipped encode"));
    }

    #[test]
    fn test_report_serializes_with_status_tag() {
        let report = EncodeReport::skipped("no engine");
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["main"]["status"], "skipped");
        assert_eq!(value["main"]["reason"], "no engine");
    }
}
