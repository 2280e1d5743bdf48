//! Frame-exact capture loop.

use stripcast_common::cancel::CancelToken;
use stripcast_common::clock::VirtualClock;
use stripcast_common::error::{StripcastError, StripcastResult};
use stripcast_strips::strip::Strip;
use stripcast_strips::sync::PlayMode;

use crate::compositor::SceneRenderer;
use crate::sink::CaptureSink;

/// Progress callback: fraction of frames captured, `(0, 1]`.
pub type ProgressCallback = Box<dyn FnMut(f64) + Send>;

/// Completion callback: the finalized raw capture.
pub type CompletionCallback = Box<dyn FnMut(&[u8]) + Send>;

/// State of a recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    /// Resetting strips and finalizing the capture.
    Ending,
}

/// Steps a strip list through the timeline at a fixed frame rate,
/// rendering and capturing every frame.
pub struct Recorder {
    renderer: Box<dyn SceneRenderer>,
    sink: Box<dyn CaptureSink>,
    strips: Vec<Strip>,
    clock: VirtualClock,
    frames: u64,
    state: RecorderState,
    cancel: CancelToken,
    on_progress: Option<ProgressCallback>,
    on_complete: Option<CompletionCallback>,
}

impl Recorder {
    pub fn new(
        renderer: Box<dyn SceneRenderer>,
        sink: Box<dyn CaptureSink>,
        fps: f64,
        frames: u64,
        strips: Vec<Strip>,
    ) -> Self {
        Self {
            renderer,
            sink,
            strips,
            clock: VirtualClock::new(fps),
            frames,
            state: RecorderState::Idle,
            cancel: CancelToken::new(),
            on_progress: None,
            on_complete: None,
        }
    }

    pub fn with_progress(mut self, callback: impl FnMut(f64) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    pub fn with_completion(mut self, callback: impl FnMut(&[u8]) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Share an externally owned cancel token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Request cancellation; the running capture stops before its next tick.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn strips(&self) -> &[Strip] {
        &self.strips
    }

    pub fn strips_mut(&mut self) -> &mut [Strip] {
        &mut self.strips
    }

    pub fn into_strips(self) -> Vec<Strip> {
        self.strips
    }

    /// Run a full capture.
    ///
    /// Returns the finalized container bytes (also delivered to the
    /// completion callback). On cancellation the strips are reset, nothing
    /// is finalized, and `Cancelled` is returned.
    pub async fn start(&mut self) -> StripcastResult<Vec<u8>> {
        if self.state != RecorderState::Idle {
            return Err(StripcastError::capture("Recorder already running"));
        }

        let (width, height) = self.renderer.size();
        tracing::info!(
            frames = self.frames,
            fps = self.clock.fps(),
            width,
            height,
            strips = self.strips.len(),
            "Starting capture"
        );

        self.clock.reset();
        self.sink.begin(width, height, self.clock.fps())?;
        self.state = RecorderState::Recording;

        match self.run_ticks().await {
            Ok(()) => self.end().await,
            Err(e) if e.is_cancelled() => {
                self.reset_strips().await;
                self.sink.discard();
                self.state = RecorderState::Idle;
                tracing::info!(
                    frame = self.clock.current_frame(),
                    "Capture cancelled"
                );
                Err(e)
            }
            Err(e) => {
                self.reset_strips().await;
                self.sink.discard();
                self.state = RecorderState::Idle;
                tracing::error!(
                    frame = self.clock.current_frame(),
                    error = %e,
                    "Capture failed"
                );
                Err(e)
            }
        }
    }

    /// The first tick always runs, so even a zero-frame capture holds the
    /// frame at time 0.
    async fn run_ticks(&mut self) -> StripcastResult<()> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(StripcastError::Cancelled);
            }
            self.tick().await?;
            tokio::task::yield_now().await;
            if self.clock.current_frame() > self.frames {
                return Ok(());
            }
        }
    }

    async fn tick(&mut self) -> StripcastResult<()> {
        let time = self.clock.time_secs();
        let delta_ms = self.clock.delta_ms();
        let fps = self.clock.fps();

        for strip in &mut self.strips {
            strip
                .update(time, delta_ms, true, PlayMode::FrameExact, fps)
                .await?;
        }

        let frame = self.renderer.render(&self.strips)?;
        self.sink.append(&frame)?;

        let ratio = if self.frames == 0 {
            1.0
        } else {
            self.clock.current_frame() as f64 / self.frames as f64
        };
        tracing::trace!(frame = self.clock.current_frame(), time, "Captured frame");
        if let Some(cb) = &mut self.on_progress {
            cb(ratio);
        }
        self.clock.advance();
        Ok(())
    }

    async fn end(&mut self) -> StripcastResult<Vec<u8>> {
        self.state = RecorderState::Ending;
        self.reset_strips().await;
        let finalized = self.sink.finalize();
        self.state = RecorderState::Idle;
        let bytes = finalized?;

        tracing::info!(
            frames = self.sink.stats().frames_written,
            bytes = bytes.len(),
            "Capture complete"
        );
        if let Some(cb) = &mut self.on_complete {
            cb(&bytes);
        }
        Ok(bytes)
    }

    /// Park every strip at time 0, not playing.
    async fn reset_strips(&mut self) {
        let delta_ms = self.clock.delta_ms();
        let fps = self.clock.fps();
        for strip in &mut self.strips {
            if let Err(e) = strip
                .update(0.0, delta_ms, false, PlayMode::Interactive, fps)
                .await
            {
                tracing::warn!(strip = strip.id(), error = %e, "Failed to reset strip");
            }
        }
    }
}
