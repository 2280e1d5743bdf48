//! Encoding engine seam.

use async_trait::async_trait;
use stripcast_common::cancel::CancelToken;
use stripcast_common::error::{StripcastError, StripcastResult};
use stripcast_project_model::asset::Asset;

/// Something the engine reported while running.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Output time encoded so far, in seconds.
    Progress { elapsed_secs: f64 },
    /// One line of engine diagnostics.
    Log(String),
}

/// An external encoder with its own scratch file space.
///
/// File names are relative to the scratch space. One invocation runs at a
/// time.
#[async_trait]
pub trait EncodingEngine: Send {
    fn name(&self) -> &str;

    async fn write_file(&mut self, name: &str, data: &[u8]) -> StripcastResult<()>;

    async fn read_file(&mut self, name: &str) -> StripcastResult<Vec<u8>>;

    async fn remove_file(&mut self, name: &str) -> StripcastResult<()>;

    /// Load an asset's bytes from its source path.
    async fn fetch_asset(&mut self, asset: &Asset) -> StripcastResult<Vec<u8>> {
        tokio::fs::read(&asset.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StripcastError::FileNotFound {
                    path: asset.path.clone().into(),
                }
            } else {
                StripcastError::Io(e)
            }
        })
    }

    /// Run one invocation with `args`, reporting events as they arrive.
    ///
    /// When `cancel` fires the invocation is halted and `Cancelled` is
    /// returned.
    async fn run(
        &mut self,
        args: &[String],
        on_event: &mut (dyn FnMut(EngineEvent) + Send),
        cancel: &CancelToken,
    ) -> StripcastResult<()>;

    /// Release engine resources. The engine is unusable afterwards.
    async fn shutdown(&mut self) -> StripcastResult<()>;
}
