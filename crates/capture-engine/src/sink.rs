//! Capture sinks: where composed frames go.

use stripcast_common::error::{StripcastError, StripcastResult};
use stripcast_strips::media::Frame;

/// Receives composed frames for one capture run.
pub trait CaptureSink: Send {
    /// Prepare for a run at the given raster size and rate.
    fn begin(&mut self, width: u32, height: u32, fps: f64) -> StripcastResult<()>;

    /// Append one frame. Frames must match the size given to `begin`.
    fn append(&mut self, frame: &Frame) -> StripcastResult<()>;

    /// Close the run and hand back the container bytes.
    fn finalize(&mut self) -> StripcastResult<Vec<u8>>;

    /// Drop everything captured so far.
    fn discard(&mut self);

    fn stats(&self) -> SinkStats;
}

/// Runtime statistics from a capture sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub frames_written: u64,
    pub bytes_written: u64,
}

/// In-memory YUV4MPEG2 writer (4:4:4, progressive, full-range BT.601).
#[derive(Debug, Default)]
pub struct Y4mSink {
    width: u32,
    height: u32,
    buffer: Vec<u8>,
    frames: u64,
    open: bool,
}

impl Y4mSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptureSink for Y4mSink {
    fn begin(&mut self, width: u32, height: u32, fps: f64) -> StripcastResult<()> {
        if width == 0 || height == 0 {
            return Err(StripcastError::capture(format!(
                "Invalid capture size {width}x{height}"
            )));
        }
        if fps.is_nan() || fps <= 0.0 {
            return Err(StripcastError::capture(format!("Invalid capture fps {fps}")));
        }
        let (num, den) = fps_rational(fps);
        self.width = width;
        self.height = height;
        self.frames = 0;
        self.buffer = format!("YUV4MPEG2 W{width} H{height} F{num}:{den} Ip A1:1 C444\n").into_bytes();
        self.open = true;
        Ok(())
    }

    fn append(&mut self, frame: &Frame) -> StripcastResult<()> {
        if !self.open {
            return Err(StripcastError::capture("Capture sink is not open"));
        }
        if frame.width != self.width || frame.height != self.height {
            return Err(StripcastError::capture(format!(
                "Frame size {}x{} does not match capture size {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }

        let pixels = self.width as usize * self.height as usize;
        self.buffer.reserve(6 + pixels * 3);
        self.buffer.extend_from_slice(b"FRAME\n");
        let planes_at = self.buffer.len();
        self.buffer.resize(planes_at + pixels * 3, 0);
        let (y_plane, rest) = self.buffer[planes_at..].split_at_mut(pixels);
        let (u_plane, v_plane) = rest.split_at_mut(pixels);
        for (i, px) in frame.rgba.chunks_exact(4).enumerate() {
            let [y, u, v] = rgb_to_yuv(px[0], px[1], px[2]);
            y_plane[i] = y;
            u_plane[i] = u;
            v_plane[i] = v;
        }
        self.frames += 1;
        Ok(())
    }

    fn finalize(&mut self) -> StripcastResult<Vec<u8>> {
        if !self.open {
            return Err(StripcastError::capture("Capture sink is not open"));
        }
        self.open = false;
        tracing::debug!(frames = self.frames, bytes = self.buffer.len(), "Finalized y4m capture");
        Ok(std::mem::take(&mut self.buffer))
    }

    fn discard(&mut self) {
        self.open = false;
        self.frames = 0;
        self.buffer.clear();
    }

    fn stats(&self) -> SinkStats {
        SinkStats {
            frames_written: self.frames,
            bytes_written: self.buffer.len() as u64,
        }
    }
}

/// Full-range BT.601 RGB → YCbCr.
pub fn rgb_to_yuv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let u = -0.168_736 * r - 0.331_264 * g + 0.5 * b + 128.0;
    let v = 0.5 * r - 0.418_688 * g - 0.081_312 * b + 128.0;
    [clamp_u8(y), clamp_u8(u), clamp_u8(v)]
}

fn clamp_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Frame rate as a reduced `num:den` pair.
pub fn fps_rational(fps: f64) -> (u64, u64) {
    if fps.fract() == 0.0 {
        return (fps as u64, 1);
    }
    let ntsc = (fps * 1001.0).round();
    if (ntsc / 1001.0 - fps).abs() < 1e-6 {
        return (ntsc as u64, 1001);
    }
    let num = (fps * 1000.0).round() as u64;
    let divisor = gcd(num, 1000);
    (num / divisor, 1000 / divisor)
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}
