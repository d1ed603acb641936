//! Oscillator waveforms.
//!
//! Each waveform maps a phase in `[0, 1)` to an amplitude in `[-1, 1]`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Oscillator shape for a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Triangle,
    Sawtooth,
    /// Uniform white noise, drawn fresh for every sample.
    Noise,
}

impl Waveform {
    /// Instantaneous value at `phase`. `rng` is only consulted for noise.
    #[inline]
    pub fn sample<R: Rng + ?Sized>(self, phase: f32, rng: &mut R) -> f32 {
        match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => triangle(phase),
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Noise => rng.random_range(-1.0f32..=1.0),
        }
    }

    /// Whether the output depends on phase at all.
    pub fn is_periodic(self) -> bool {
        !matches!(self, Waveform::Noise)
    }
}

/// Piecewise-linear triangle: 0 → 1 → -1 → 0 over one period.
#[inline]
fn triangle(phase: f32) -> f32 {
    if phase < 0.25 {
        4.0 * phase
    } else if phase < 0.75 {
        2.0 - 4.0 * phase
    } else {
        4.0 * phase - 4.0
    }
}

/// Wrap a phase accumulator back into `[0, 1)`.
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase - phase.floor();
    // `x - floor(x)` can round up to exactly 1.0 for tiny negative inputs.
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}
