//! Clock and timing utilities for timeline synchronization.
//!
//! Capture never looks at wall-clock time: it advances a [`VirtualClock`]
//! by exactly one frame per tick. Interactive preview uses a
//! [`PlaybackClock`] anchored to a monotonic instant so media positions can
//! drift naturally between re-seeks.

use std::time::Instant;

/// Allowed deviation (ms) between a caller's tick interval and one frame
/// at the target fps before a strip forces a re-seek.
pub const FPS_ERROR_TOLERANCE_MS: f64 = 0.01;

/// Number of frames covering `duration_secs` at `fps`.
pub fn frame_count(duration_secs: f64, fps: f64) -> u64 {
    (duration_secs * fps).round().max(0.0) as u64
}

/// Duration of one frame in milliseconds.
pub fn frame_interval_ms(fps: f64) -> f64 {
    1000.0 / fps
}

/// Whether a tick interval of `delta_ms` is off the frame grid for `fps`
/// by more than `tolerance_ms` in either direction.
pub fn is_off_frame_interval(delta_ms: f64, fps: f64, tolerance_ms: f64) -> bool {
    (delta_ms - frame_interval_ms(fps)).abs() > tolerance_ms
}

/// Fixed-step timeline clock used by the capture loop.
///
/// `current_frame` is one-based: the first tick reports frame 1.
#[derive(Debug, Clone)]
pub struct VirtualClock {
    fps: f64,
    time_secs: f64,
    current_frame: u64,
}

impl VirtualClock {
    pub fn new(fps: f64) -> Self {
        Self {
            fps,
            time_secs: 0.0,
            current_frame: 1,
        }
    }

    /// Timeline time of the current tick, in seconds.
    pub fn time_secs(&self) -> f64 {
        self.time_secs
    }

    /// One-based index of the frame about to be captured.
    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Tick interval in milliseconds.
    pub fn delta_ms(&self) -> f64 {
        frame_interval_ms(self.fps)
    }

    /// Advance by exactly one frame.
    pub fn advance(&mut self) {
        self.time_secs += 1.0 / self.fps;
        self.current_frame += 1;
    }

    pub fn reset(&mut self) {
        self.time_secs = 0.0;
        self.current_frame = 1;
    }
}

/// A media playback position that advances with wall-clock time while
/// playing and holds still while paused.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    base_secs: f64,
    running_since: Option<Instant>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self {
            base_secs: 0.0,
            running_since: None,
        }
    }

    /// Current position in seconds.
    pub fn position_secs(&self) -> f64 {
        match self.running_since {
            Some(since) => self.base_secs + since.elapsed().as_secs_f64(),
            None => self.base_secs,
        }
    }

    /// Jump to `secs`, keeping the running/paused state.
    pub fn set_position(&mut self, secs: f64) {
        self.base_secs = secs;
        if self.running_since.is_some() {
            self.running_since = Some(Instant::now());
        }
    }

    pub fn play(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        if self.running_since.is_some() {
            self.base_secs = self.position_secs();
            self.running_since = None;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.running_since.is_none()
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_frame_count_rounds() {
        assert_eq!(frame_count(10.0, 30.0), 300);
        assert_eq!(frame_count(1.01, 30.0), 30);
        assert_eq!(frame_count(1.02, 30.0), 31);
    }

    #[test]
    fn test_off_frame_interval_either_side() {
        let exact = frame_interval_ms(30.0);
        assert!(!is_off_frame_interval(exact, 30.0, FPS_ERROR_TOLERANCE_MS));
        assert!(!is_off_frame_interval(exact + 0.005, 30.0, FPS_ERROR_TOLERANCE_MS));
        assert!(is_off_frame_interval(exact - 0.02, 30.0, FPS_ERROR_TOLERANCE_MS));
        assert!(is_off_frame_interval(exact + 0.02, 30.0, FPS_ERROR_TOLERANCE_MS));
        assert!(is_off_frame_interval(16.6, 30.0, FPS_ERROR_TOLERANCE_MS));
    }

    #[test]
    fn test_virtual_clock_advances_one_frame() {
        let mut clock = VirtualClock::new(25.0);
        assert_eq!(clock.current_frame(), 1);
        assert_eq!(clock.time_secs(), 0.0);
        clock.advance();
        assert_eq!(clock.current_frame(), 2);
        assert!((clock.time_secs() - 0.04).abs() < 1e-12);
        clock.reset();
        assert_eq!(clock.current_frame(), 1);
    }

    #[test]
    fn test_playback_clock_holds_when_paused() {
        let mut clock = PlaybackClock::new();
        clock.set_position(3.5);
        assert!(clock.is_paused());
        assert_eq!(clock.position_secs(), 3.5);
        clock.play();
        assert!(!clock.is_paused());
        assert!(clock.position_secs() >= 3.5);
        clock.pause();
        let held = clock.position_secs();
        assert_eq!(clock.position_secs(), held);
    }

    proptest! {
        #[test]
        fn frame_count_matches_rounded_product(duration in 0.001f64..3600.0, fps in 1.0f64..240.0) {
            prop_assert_eq!(frame_count(duration, fps), (duration * fps).round() as u64);
        }
    }
}
