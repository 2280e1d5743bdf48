//! Initialize a new Stripcast project.

use std::path::PathBuf;

use stripcast_project_model::Project;

pub fn run(
    name: String,
    output: PathBuf,
    width: u32,
    height: u32,
    fps: f64,
    duration: f64,
) -> anyhow::Result<()> {
    let path = output.join(format!("{name}.json"));
    println!("Creating project '{}' at {}", name, path.display());

    let project = Project::new(&name, width, height, fps, duration);
    let errors = project.validate();
    if !errors.is_empty() {
        anyhow::bail!("Invalid project parameters: {}", errors.join("; "));
    }
    project
        .save(&path)
        .map_err(|e| anyhow::anyhow!("Failed to create project: {e}"))?;

    println!("Project created successfully:");
    println!("  Resolution: {width}x{height}");
    println!("  FPS: {fps}");
    println!("  Duration: {duration}s ({} frames)", project.frames());

    Ok(())
}
