//! Check for the encoding engine.

use stripcast_common::config::AppConfig;
use stripcast_render_engine::FfmpegEngine;

pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Stripcast System Check");
    println!("{}", "=".repeat(50));

    let ffmpeg = &config.encoding.ffmpeg_path;
    let ffprobe = &config.encoding.ffprobe_path;
    let ffmpeg_ok = FfmpegEngine::is_available(ffmpeg).await;
    let ffprobe_ok = FfmpegEngine::is_available(ffprobe).await;

    report("Encoding engine", ffmpeg_ok, &ffmpeg.display().to_string());
    report("Media probe", ffprobe_ok, &ffprobe.display().to_string());
    println!("[OK] Scratch directory: {}", config.scratch_dir.display());
    println!(
        "[OK] Codecs: {} / {} / {}",
        config.encoding.video_codec, config.encoding.pixel_format, config.encoding.audio_codec
    );

    println!();
    if ffmpeg_ok && ffprobe_ok {
        println!("All required tools are available. Stripcast is ready.");
    } else {
        println!("Some tools are missing. Renders will skip encoding or leave media blank.");
    }

    Ok(())
}

fn report(label: &str, ok: bool, binary: &str) {
    if ok {
        println!("[OK] {label}: {binary}");
    } else {
        println!("[WARN] {label}: {binary} not found");
    }
}
