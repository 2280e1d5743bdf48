//! Render-ready textured quads.

use std::sync::Arc;

use stripcast_project_model::strip::Vector3;

use crate::media::Frame;

/// A flat, camera-facing rectangle in scene space.
///
/// `position` is the quad center; `z` carries the strip layer so the
/// renderer can depth-order quads.
#[derive(Debug, Clone, Default)]
pub struct Quad {
    pub position: Vector3,
    pub width: f64,
    pub height: f64,
    pub visible: bool,
    pub texture: Option<Arc<Frame>>,
}

impl Quad {
    pub fn new(position: Vector3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Place the quad at `position` with depth taken from `layer`.
    pub fn place(&mut self, position: Vector3, layer: i32) {
        self.position = Vector3 {
            z: layer as f64,
            ..position
        };
    }

    /// Size the quad to `percent`% of a native `width`×`height`.
    pub fn scale_to(&mut self, width: u32, height: u32, percent: f64) {
        self.width = width as f64 * percent / 100.0;
        self.height = height as f64 * percent / 100.0;
    }
}
