//! Fixed-timestep audio frame accounting.
//!
//! A game loop ticking at `fps` consumes `sample_rate / fps` audio frames per
//! tick. That ratio is rarely an integer, so the remainder is carried in
//! integer arithmetic and the long-run frame count never drifts.

use serde::{Deserialize, Serialize};

/// Yields the number of audio frames to render on each game tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameClock {
    sample_rate: u32,
    fps: u32,
    /// Remainder numerator carried between ticks (in units of 1/fps frames).
    remainder: u32,
    ticks: u64,
}

impl FrameClock {
    /// Create a clock for the given sample rate and tick rate.
    /// A zero `fps` is treated as 1.
    pub fn new(sample_rate: u32, fps: u32) -> Self {
        Self {
            sample_rate,
            fps: fps.max(1),
            remainder: 0,
            ticks: 0,
        }
    }

    /// Frames to render for the next tick.
    #[inline]
    pub fn next_frames(&mut self) -> usize {
        let total = self.sample_rate as u64 + self.remainder as u64;
        let frames = total / self.fps as u64;
        self.remainder = (total % self.fps as u64) as u32;
        self.ticks += 1;
        frames as usize
    }

    /// Nominal (floored) frames per tick.
    pub fn nominal_frames(&self) -> usize {
        (self.sample_rate / self.fps) as usize
    }

    /// Tick period in seconds.
    pub fn tick_seconds(&self) -> f64 {
        1.0 / self.fps as f64
    }

    /// Number of ticks produced so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Sample rate the clock counts frames at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Ticks per second, at least 1.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Reset the carried remainder, e.g. after the sample rate changed.
    pub fn reset(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.remainder = 0;
        self.ticks = 0;
    }
}
