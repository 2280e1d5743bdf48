//! Text strips. Glyph rasterization happens outside the strip; the strip
//! only owns placement, visibility, and the supplied texture.

use std::sync::Arc;

use stripcast_project_model::strip::{TextStripDescription, Vector3};

use crate::media::Frame;
use crate::quad::Quad;
use crate::strip::StripTiming;

pub struct TextStrip {
    id: String,
    pub timing: StripTiming,
    pub position: Vector3,
    pub text: String,
    pub font_size: f64,
    pub color: String,
    quad: Quad,
}

impl TextStrip {
    pub fn new(id: String, desc: &TextStripDescription) -> Self {
        let timing = StripTiming::from(&desc.base);
        let mut quad = Quad::new(desc.position);
        quad.place(desc.position, timing.layer);
        Self {
            id,
            timing,
            position: desc.position,
            text: desc.text.clone(),
            font_size: desc.font_size,
            color: desc.color.clone(),
            quad,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn quad(&self) -> &Quad {
        &self.quad
    }

    /// Install a rendered texture for the current text; the quad takes its size.
    pub fn set_texture(&mut self, texture: Arc<Frame>) {
        self.quad.width = texture.width as f64;
        self.quad.height = texture.height as f64;
        self.quad.texture = Some(texture);
    }

    pub fn update(&mut self, time: f64) {
        self.quad.place(self.position, self.timing.layer);
        self.quad.visible = self.timing.is_active(time);
    }

    pub fn to_description(&self) -> TextStripDescription {
        TextStripDescription {
            base: self.timing.to_base(&self.id, None),
            position: self.position,
            text: self.text.clone(),
            font_size: self.font_size,
            color: self.color.clone(),
        }
    }
}
