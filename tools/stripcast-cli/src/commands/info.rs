//! Show project information.

use std::path::PathBuf;

use stripcast_project_model::StripDescription;

use super::load_project;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let project = load_project(&path)?;

    println!("Project: {}", project.name);
    println!("  Version: {}", project.version);
    println!(
        "  Output: {}x{} @ {}fps",
        project.width, project.height, project.fps
    );
    println!(
        "  Duration: {:.2}s ({} frames)",
        project.duration,
        project.frames()
    );
    println!();

    println!("Assets:");
    if project.assets.is_empty() {
        println!("  (none)");
    }
    for asset in &project.assets {
        println!("  {} [{:?}] {} ({})", asset.id, asset.kind, asset.name, asset.path);
    }
    println!();

    println!("Strips:");
    if project.strips.is_empty() {
        println!("  (none)");
    }
    for strip in &project.strips {
        let base = strip.base();
        let detail = match strip {
            StripDescription::Video(v) => format!("offset {:.2}s", v.video_offset),
            StripDescription::Text(t) => format!("{:?}", t.text),
            _ => String::new(),
        };
        println!(
            "  {:<6} {} layer {} [{:.2}s, {:.2}s) {} {}",
            strip.kind().as_str(),
            base.id.as_deref().unwrap_or("-"),
            base.layer,
            base.start,
            base.end(),
            strip.asset_id().unwrap_or(""),
            detail
        );
    }

    Ok(())
}
