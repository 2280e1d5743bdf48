//! Stripcast Capture Engine
//!
//! Drives a strip list through the timeline one frame at a time and
//! captures every composed frame into a raw video container.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 Recorder                     │
//! │  ┌──────────┐  ┌───────────────┐  ┌────────┐ │
//! │  │ Strips   │─▶│ SceneRenderer │─▶│ Sink   │ │
//! │  │ update() │  │ (compositor)  │  │ (y4m)  │ │
//! │  └──────────┘  └───────────────┘  └───┬────┘ │
//! │                                       ▼      │
//! │                             raw capture bytes│
//! └─────────────────────────────────────────────┘
//! ```

pub mod compositor;
pub mod recorder;
pub mod sink;

pub use compositor::*;
pub use recorder::*;
pub use sink::*;
