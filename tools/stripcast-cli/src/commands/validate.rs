//! Validate a Stripcast project file.

use std::path::PathBuf;

use super::load_project;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating project at: {}", path.display());

    let project = load_project(&path)?;

    println!("  Name: {}", project.name);
    println!("  Version: {}", project.version);
    println!("  Resolution: {}x{}", project.width, project.height);
    println!("  FPS: {}", project.fps);
    println!("  Duration: {:.2}s ({} frames)", project.duration, project.frames());
    println!("  Assets: {}", project.assets.len());
    println!("  Strips: {}", project.strips.len());

    let missing: Vec<String> = project
        .assets
        .iter()
        .filter(|a| !a.path.is_empty() && !std::path::Path::new(&a.path).exists())
        .map(|a| format!("asset {}: source not found at {}", a.id, a.path))
        .collect();

    let mut errors = project.validate();
    errors.extend(missing);
    if errors.is_empty() {
        println!("  Sources: All present");
        println!("\nProject is valid.");
    } else {
        println!("\nValidation issues:");
        for error in &errors {
            println!("  - {error}");
        }
        println!(
            "\n{} issue(s) found. Project may not be fully usable.",
            errors.len()
        );
    }

    Ok(())
}
