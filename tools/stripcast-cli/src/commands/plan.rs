//! Print the encoder invocations for a project.

use std::path::PathBuf;

use stripcast_common::config::AppConfig;
use stripcast_render_engine::EncodePlan;
use stripcast_strips::ffmpeg::FfmpegMediaFactory;
use stripcast_strips::Strip;

use super::load_project;
use super::timeline::{encode_settings, load_strips, MEDIA_LOAD_TIMEOUT};

pub async fn run(path: PathBuf, json: bool, config: &AppConfig) -> anyhow::Result<()> {
    let project = load_project(&path)?;

    // Same media loading as `render`, so audio layout matches the real encode.
    let factory = FfmpegMediaFactory::from_config(&config.encoding);
    let strips = load_strips(&project, config, &factory, MEDIA_LOAD_TIMEOUT).await?;
    let sources: Vec<_> = strips.iter().filter_map(Strip::encode_source).collect();
    let settings = encode_settings(&project, config);
    let plan = EncodePlan::new(&settings, &sources);

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let program = config.encoding.ffmpeg_path.display().to_string();
    println!(
        "# {} media track(s), {} frames",
        sources.len(),
        settings.frames()
    );
    for line in plan.command_lines(&program) {
        println!("{line}");
    }

    Ok(())
}
