//! Stripcast Strips
//!
//! Runtime timeline strips. Every strip exposes the same per-frame
//! contract, [`Strip::update`], which moves its media to a timeline time
//! and toggles visibility/audibility for the strip's active window.
//!
//! # Synchronization modes
//!
//! ```text
//! Interactive ── re-seek only when the tick interval drifts off the
//!                frame grid; otherwise let playback run
//! FrameExact  ── seek and wait for the media to confirm the exact
//!                position (bounded by the seek timeout)
//! ```
//!
//! Media decoding sits behind [`media::MediaHandle`]; the ffmpeg-backed
//! implementation lives in [`ffmpeg`].

pub mod audio;
pub mod ffmpeg;
pub mod image;
pub mod media;
pub mod quad;
pub mod source;
pub mod strip;
pub mod sync;
pub mod text;
pub mod video;

#[cfg(test)]
mod test_support;

pub use audio::AudioStrip;
pub use image::ImageStrip;
pub use media::*;
pub use quad::Quad;
pub use source::*;
pub use strip::*;
pub use sync::*;
pub use text::TextStrip;
pub use video::VideoStrip;
