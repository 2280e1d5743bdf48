//! Scene rendering.
//!
//! The flat compositor draws every visible, textured quad onto an opaque
//! black raster. Scene space has its origin at the raster center with y
//! pointing up; quads are drawn in ascending layer order, and quads on the
//! same layer keep strip-list order.

use stripcast_common::error::StripcastResult;
use stripcast_strips::media::Frame;
use stripcast_strips::quad::Quad;
use stripcast_strips::strip::Strip;

/// Turns the current state of a strip list into one frame.
pub trait SceneRenderer: Send {
    /// Output raster size.
    fn size(&self) -> (u32, u32);

    fn render(&mut self, strips: &[Strip]) -> StripcastResult<Frame>;
}

/// Orthographic, layer-ordered quad compositor.
#[derive(Debug, Clone)]
pub struct FlatCompositor {
    width: u32,
    height: u32,
    background: [u8; 4],
}

impl FlatCompositor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: [0, 0, 0, 255],
        }
    }

    /// Composite a set of quads directly.
    pub fn compose<'a>(&self, quads: impl IntoIterator<Item = &'a Quad>) -> Frame {
        let mut canvas = Frame::solid(self.width, self.height, self.background);
        let mut visible: Vec<&Quad> = quads.into_iter().filter(|q| q.visible).collect();
        visible.sort_by(|a, b| a.position.z.total_cmp(&b.position.z));
        for quad in visible {
            self.draw(&mut canvas, quad);
        }
        canvas
    }

    fn draw(&self, canvas: &mut Frame, quad: &Quad) {
        let Some(texture) = quad.texture.as_deref() else {
            return;
        };
        if quad.width <= 0.0 || quad.height <= 0.0 || texture.width == 0 || texture.height == 0 {
            return;
        }

        let left = self.width as f64 / 2.0 + quad.position.x - quad.width / 2.0;
        let top = self.height as f64 / 2.0 - quad.position.y - quad.height / 2.0;
        let x0 = left.floor().max(0.0) as u32;
        let y0 = top.floor().max(0.0) as u32;
        let x1 = ((left + quad.width).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((top + quad.height).ceil().max(0.0) as u32).min(self.height);

        for py in y0..y1 {
            let v = (py as f64 + 0.5 - top) / quad.height;
            if !(0.0..1.0).contains(&v) {
                continue;
            }
            let ty = ((v * texture.height as f64) as u32).min(texture.height - 1);
            for px in x0..x1 {
                let u = (px as f64 + 0.5 - left) / quad.width;
                if !(0.0..1.0).contains(&u) {
                    continue;
                }
                let tx = ((u * texture.width as f64) as u32).min(texture.width - 1);
                let src = texture.pixel(tx, ty);
                let idx = (py as usize * self.width as usize + px as usize) * 4;
                blend_over(&mut canvas.rgba[idx..idx + 4], src);
            }
        }
    }
}

impl SceneRenderer for FlatCompositor {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn render(&mut self, strips: &[Strip]) -> StripcastResult<Frame> {
        Ok(self.compose(strips.iter().filter_map(Strip::quad)))
    }
}

fn blend_over(dst: &mut [u8], src: [u8; 4]) {
    let alpha = src[3] as u32;
    if alpha == 255 {
        dst[..3].copy_from_slice(&src[..3]);
        return;
    }
    for c in 0..3 {
        dst[c] = ((src[c] as u32 * alpha + dst[c] as u32 * (255 - alpha) + 127) / 255) as u8;
    }
}
