pub mod check;
pub mod info;
pub mod init;
pub mod plan;
pub mod render;
mod timeline;
pub mod validate;

use std::path::Path;

use stripcast_project_model::Project;

pub(crate) fn load_project(path: &Path) -> anyhow::Result<Project> {
    Project::load(path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))
}
