//! Stripcast Project Model
//!
//! Defines the plain data contracts that the editor persists and the
//! capture/encode pipeline reads:
//! - **Assets:** Source media referenced by strips
//! - **Strips:** Timed timeline elements (video, audio, image, text)
//! - **Project:** Timeline parameters plus the asset and strip lists
//! - **Migration:** Version-gated rewrites applied before deserialization
//!
//! All times are in seconds on the composition timeline.

pub mod asset;
pub mod migration;
pub mod project;
pub mod strip;

pub use asset::*;
pub use migration::*;
pub use project::*;
pub use strip::*;
