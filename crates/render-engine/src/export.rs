//! Handing the finished artifact to its destination.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use stripcast_common::error::{StripcastError, StripcastResult};

/// Receives the final deliverable.
#[async_trait]
pub trait ExportSink: Send {
    async fn export(&mut self, file_name: &str, data: &[u8]) -> StripcastResult<()>;
}

/// Writes the deliverable to a path on disk.
#[derive(Debug, Clone)]
pub struct FileExport {
    path: PathBuf,
}

impl FileExport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ExportSink for FileExport {
    async fn export(&mut self, file_name: &str, data: &[u8]) -> StripcastResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, data).await.map_err(|e| {
            StripcastError::export(format!(
                "Failed to write {file_name} to {}: {e}",
                self.path.display()
            ))
        })?;
        tracing::info!(
            path = %self.path.display(),
            bytes = data.len(),
            "Exported {file_name}"
        );
        Ok(())
    }
}

/// Keeps the deliverable in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryExport {
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

#[async_trait]
impl ExportSink for MemoryExport {
    async fn export(&mut self, file_name: &str, data: &[u8]) -> StripcastResult<()> {
        self.file_name = Some(file_name.to_string());
        self.data = data.to_vec();
        Ok(())
    }
}
