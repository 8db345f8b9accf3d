//! Coalesces bursts of scroll events into one update per animation frame.

use std::time::Duration;

/// Nominal frame length of a 60 Hz display.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// The "ticking" flag of a request-animation-frame throttle.
///
/// [`FrameGate::request`] returns `true` only for the first event after a
/// frame ran; the caller schedules exactly one frame callback for it. The
/// callback calls [`FrameGate::complete`] and then reads the *latest* scroll
/// offset, so the update is trailing-edge.
#[derive(Debug, Default)]
pub struct FrameGate {
    ticking: bool,
    frames_run: u64,
}

impl FrameGate {
    pub fn request(&mut self) -> bool {
        if self.ticking {
            return false;
        }
        self.ticking = true;
        true
    }

    pub fn complete(&mut self) {
        self.ticking = false;
        self.frames_run += 1;
    }

    pub fn is_pending(&self) -> bool {
        self.ticking
    }

    pub fn frames_run(&self) -> u64 {
        self.frames_run
    }
}
