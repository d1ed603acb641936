//! Chirp Core - Foundation types for the audio pipeline
//!
//! This crate provides the types shared by the audio engine and its hosts:
//! - Error taxonomy (`AudioError`, `Result`)
//! - Engine configuration (`AudioConfig`)
//! - Device negotiation (`StreamRequest`, `NegotiatedFormat`)
//! - Fixed-timestep frame accounting (`FrameClock`)

pub mod config;
pub mod error;
pub mod format;
pub mod time;

pub use config::AudioConfig;
pub use error::{AudioError, Result};
pub use format::{NegotiatedFormat, StreamRequest};
pub use time::FrameClock;

/// Limits shared by the engine and its configuration.
pub mod limits {
    /// Number of statically allocated SFX channels.
    pub const SFX_CHANNELS: usize = 8;

    /// Number of channels owned by the music player.
    pub const MUSIC_CHANNELS: usize = 4;

    /// Smallest ring multiplier accepted (callback periods buffered).
    pub const MIN_RING_MULTIPLIER: usize = 2;

    /// Largest ring multiplier accepted.
    pub const MAX_RING_MULTIPLIER: usize = 16;

    /// Largest channel count the engine renders.
    pub const MAX_OUTPUT_CHANNELS: u16 = 8;
}
