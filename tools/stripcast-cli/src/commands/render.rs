//! Capture a project frame by frame and encode it.

use std::io::Write;
use std::path::PathBuf;

use stripcast_capture_engine::{FlatCompositor, Recorder, Y4mSink};
use stripcast_common::cancel::CancelToken;
use stripcast_common::config::AppConfig;
use stripcast_common::error::StripcastResult;
use stripcast_render_engine::{
    EncodeReport, Encoder, EncodingEngine, ExportSink, FfmpegEngine, FileExport, PhaseStatus,
};
use stripcast_strips::ffmpeg::FfmpegMediaFactory;

use super::load_project;
use super::timeline::{encode_settings, load_strips, MEDIA_LOAD_TIMEOUT};

/// How an encode-and-export run ended.
#[derive(Debug, PartialEq)]
pub(crate) enum RenderOutcome {
    Completed,
    Cancelled,
    Incomplete(EncodeReport),
}

pub async fn run(
    path: PathBuf,
    output: Option<PathBuf>,
    frames_only: bool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    println!("Rendering project at: {}", path.display());

    let project = load_project(&path)?;
    let errors = project.validate();
    if !errors.is_empty() {
        anyhow::bail!("Project is invalid: {}", errors.join("; "));
    }

    let extension = if frames_only { "y4m" } else { "mp4" };
    let output_path = output.unwrap_or_else(|| path.with_extension(extension));
    let frames = project.frames();
    println!("  Output: {}", output_path.display());
    println!(
        "  Resolution: {}x{} @ {}fps ({} frames)",
        project.width, project.height, project.fps, frames
    );

    let factory = FfmpegMediaFactory::from_config(&config.encoding);
    let strips = load_strips(&project, config, &factory, MEDIA_LOAD_TIMEOUT).await?;

    let cancel = CancelToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let mut recorder = Recorder::new(
        Box::new(FlatCompositor::new(project.width, project.height)),
        Box::new(Y4mSink::new()),
        project.fps,
        frames,
        strips,
    )
    .with_cancel_token(cancel.clone())
    .with_progress(|ratio| print_progress("Capture", ratio));

    let captured = recorder.start().await;
    println!();
    let raw = match captured {
        Ok(raw) => raw,
        Err(e) if e.is_cancelled() => {
            println!("Render cancelled.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let strips = recorder.into_strips();

    if frames_only {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&output_path, &raw)?;
        println!("Capture written: {}", output_path.display());
        return Ok(());
    }

    let engine: Option<Box<dyn EncodingEngine>> =
        if FfmpegEngine::is_available(&config.encoding.ffmpeg_path).await {
            let scratch = config
                .scratch_dir
                .join(format!("render-{}", std::process::id()));
            Some(Box::new(
                FfmpegEngine::new(&config.encoding.ffmpeg_path, scratch).await?,
            ))
        } else {
            tracing::warn!(
                ffmpeg = %config.encoding.ffmpeg_path.display(),
                "Encoding engine not found"
            );
            None
        };

    let encoder = Encoder::new(encode_settings(&project, config), &strips, engine)
        .with_cancel_token(cancel)
        .with_preparation_progress(|ratio| print_progress("Preparing media", ratio))
        .with_progress(|ratio| print_progress("Encoding", ratio.min(1.0)));

    let mut sink = FileExport::new(&output_path);
    let outcome = encode_and_export(encoder, &raw, &mut sink).await;
    println!();

    match outcome? {
        RenderOutcome::Completed => println!("Render complete: {}", output_path.display()),
        RenderOutcome::Cancelled => println!("Render cancelled."),
        RenderOutcome::Incomplete(report) => {
            println!("Encode did not complete:");
            println!("  Preparation: {:?}", report.preparation);
            println!("  Main: {:?}", report.main);
        }
    }

    Ok(())
}

/// Encode `raw`, hand the result to `sink`, and close the encoder on every path.
pub(crate) async fn encode_and_export(
    mut encoder: Encoder,
    raw: &[u8],
    sink: &mut dyn ExportSink,
) -> StripcastResult<RenderOutcome> {
    let result = export_encoded(&mut encoder, raw, sink).await;
    encoder.close().await;
    match result {
        Err(e) if e.is_cancelled() => Ok(RenderOutcome::Cancelled),
        other => other,
    }
}

async fn export_encoded(
    encoder: &mut Encoder,
    raw: &[u8],
    sink: &mut dyn ExportSink,
) -> StripcastResult<RenderOutcome> {
    let report = encoder.encode(raw).await?;
    if report.is_complete() {
        encoder.download_output(sink).await?;
        return Ok(RenderOutcome::Completed);
    }
    if report.preparation == PhaseStatus::Cancelled || report.main == PhaseStatus::Cancelled {
        return Ok(RenderOutcome::Cancelled);
    }
    Ok(RenderOutcome::Incomplete(report))
}

fn print_progress(label: &str, ratio: f64) {
    print!("\r  {label}: {:.1}%  ", ratio * 100.0);
    std::io::stdout().flush().ok();
}
