//! Stream format negotiation types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Size in bytes of one output sample (interleaved f32).
pub const BYTES_PER_SAMPLE: usize = std::mem::size_of::<f32>();

/// What the engine asks the device for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRequest {
    pub sample_rate: u32,
    pub channels: u16,
    /// Callback period in frames.
    pub buffer_size: u32,
}

/// What the device actually opened with.
///
/// Any field may differ from the matching [`StreamRequest`]; all downstream
/// math uses these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiatedFormat {
    pub sample_rate: u32,
    pub channels: u16,
    /// Callback period in frames as reported by the device.
    pub buffer_size: u32,
}

impl NegotiatedFormat {
    /// A format that matches the request exactly.
    pub fn from_request(request: &StreamRequest) -> Self {
        Self {
            sample_rate: request.sample_rate,
            channels: request.channels,
            buffer_size: request.buffer_size,
        }
    }

    /// Interleaved sample count for `frames` frames.
    #[inline]
    pub fn frames_to_samples(&self, frames: usize) -> usize {
        frames * self.channels as usize
    }

    /// Ring buffer capacity in samples for the given multiplier.
    pub fn ring_capacity(&self, multiplier: usize) -> usize {
        self.buffer_size as usize * self.channels as usize * multiplier
    }

    /// Whether the device changed anything we asked for.
    pub fn differs_from(&self, request: &StreamRequest) -> bool {
        self.sample_rate != request.sample_rate
            || self.channels != request.channels
            || self.buffer_size != request.buffer_size
    }

    /// Duration of one callback period in milliseconds.
    pub fn period_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.buffer_size as f64 * 1000.0 / self.sample_rate as f64
    }
}

impl fmt::Display for NegotiatedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {} ch, {} frames/callback",
            self.sample_rate, self.channels, self.buffer_size
        )
    }
}
