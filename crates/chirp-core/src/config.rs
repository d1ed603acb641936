//! Engine configuration.
//!
//! Loaded from JSON; every field has a default so a partial (or empty)
//! document is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{AudioError, Result};
use crate::format::StreamRequest;
use crate::limits;

/// Seed used for the noise generator unless configured otherwise.
pub const DEFAULT_NOISE_SEED: u64 = 0x5EED_C41F;

/// Audio engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Requested sample rate in Hz. The device may pick another.
    pub sample_rate: u32,
    /// Requested output channel count.
    pub channels: u16,
    /// Requested callback period in frames.
    pub buffer_size: u32,
    /// Ring capacity in callback periods.
    pub ring_multiplier: usize,
    /// Initial master volume (0.0 to 1.0).
    pub master_volume: f32,
    /// Game loop rate, used to derive frames per tick.
    pub target_fps: u32,
    /// Ramp volume changes across one block instead of stepping.
    pub smooth_volume: bool,
    /// Seed for the noise waveform generator.
    pub noise_seed: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_size: 1024,
            ring_multiplier: 4,
            master_volume: 1.0,
            target_fps: 60,
            smooth_volume: false,
            noise_seed: DEFAULT_NOISE_SEED,
        }
    }
}

impl AudioConfig {
    /// Parse a configuration from JSON bytes.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let config: Self = serde_json::from_slice(data)
            .map_err(|e| AudioError::Serialization(format!("Invalid audio config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let config = Self::from_json(&data)?;
        debug!("Loaded audio config from {:?}", path);
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| AudioError::Serialization(format!("Failed to serialize config: {}", e)))
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(AudioError::InvalidConfig("sample_rate must be > 0".into()));
        }
        if self.channels == 0 || self.channels > limits::MAX_OUTPUT_CHANNELS {
            return Err(AudioError::InvalidConfig(format!(
                "channels must be in 1..={}, got {}",
                limits::MAX_OUTPUT_CHANNELS,
                self.channels
            )));
        }
        if self.buffer_size == 0 {
            return Err(AudioError::InvalidConfig("buffer_size must be > 0".into()));
        }
        if self.target_fps == 0 {
            return Err(AudioError::InvalidConfig("target_fps must be > 0".into()));
        }
        Ok(())
    }

    /// Ring multiplier clamped to the supported range.
    pub fn effective_ring_multiplier(&self) -> usize {
        self.ring_multiplier
            .clamp(limits::MIN_RING_MULTIPLIER, limits::MAX_RING_MULTIPLIER)
    }

    /// The stream parameters to ask the device for.
    pub fn stream_request(&self) -> StreamRequest {
        StreamRequest {
            sample_rate: self.sample_rate,
            channels: self.channels,
            buffer_size: self.buffer_size,
        }
    }
}
