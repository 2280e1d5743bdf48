//! Stripcast Render Engine
//!
//! Turns a raw capture plus the timeline's media strips into the final
//! deliverable by driving an external encoding engine in two phases.
//!
//! # Pipeline Architecture
//!
//! ```text
//! _capture.y4m ───────────────────────────────┐
//!                                             │
//! asset ──▶ <assetId><ext> ──(trim)──▶ <stripId><ext> ──┤  phase 1
//!                                             │
//!              adelay per audio input ──▶ amix ┤  phase 2
//!                                             ▼
//!                                 libx264 / aac ──▶ out.mp4 ──▶ export
//! ```
//!
//! Every scratch file goes through the [`ScratchRegistry`]; whatever the
//! outcome of an encode, the registry is drained before it returns.

pub mod encoder;
pub mod engine;
pub mod export;
pub mod ffmpeg;
pub mod plan;
pub mod scratch;

pub use encoder::*;
pub use engine::*;
pub use export::*;
pub use ffmpeg::FfmpegEngine;
pub use plan::*;
pub use scratch::ScratchRegistry;
