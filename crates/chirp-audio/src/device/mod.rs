//! Platform audio device abstraction.
//!
//! A device is opened in two phases: [`AudioDevice::negotiate`] settles the
//! actual stream format, then [`AudioDevice::open`] takes ownership of the
//! [`AudioCallback`] and builds a paused stream around it. The callback is
//! the only object that crosses onto the device thread.

mod cpal_device;
mod manual;

pub use cpal_device::CpalDevice;
pub use manual::{ManualDevice, ManualDeviceHandle};

use chirp_core::format::BYTES_PER_SAMPLE;
use chirp_core::{NegotiatedFormat, Result, StreamRequest};
use std::sync::Arc;

use crate::ring_buffer::Consumer;
use crate::stats::AudioStats;

/// A platform output device.
///
/// All methods run on the producer thread. Implementations may block.
pub trait AudioDevice {
    /// Pick the stream format. The result may differ from `request`.
    fn negotiate(&mut self, request: &StreamRequest) -> Result<NegotiatedFormat>;

    /// Build the stream around `callback`, leaving it paused.
    fn open(&mut self, callback: AudioCallback) -> Result<()>;

    /// Start (or restart) invoking the callback.
    fn resume(&mut self) -> Result<()>;

    /// Stop invoking the callback. The stream stays open.
    fn pause(&mut self) -> Result<()>;

    /// Tear down the stream. Once this returns the callback is never
    /// invoked again.
    fn close(&mut self);

    /// Human-readable device name for logs.
    fn name(&self) -> String {
        "unknown device".to_string()
    }
}

/// Consumer-side context handed to the device exactly once.
///
/// Owns the ring buffer's read half. Rendering copies out of the ring, pads
/// underruns with silence and bumps relaxed counters; it never locks,
/// allocates or logs.
pub struct AudioCallback {
    consumer: Consumer<f32>,
    stats: Arc<AudioStats>,
}

/// Samples converted per pass when the byte buffer is not f32-aligned.
const UNALIGNED_CHUNK: usize = 256;

impl AudioCallback {
    pub(crate) fn new(consumer: Consumer<f32>, stats: Arc<AudioStats>) -> Self {
        Self { consumer, stats }
    }

    /// Fill an interleaved f32 buffer.
    #[inline]
    pub fn render(&mut self, dest: &mut [f32]) {
        let delivered = self.consumer.read(dest);
        self.stats.record_callback(dest.len(), delivered);
    }

    /// Fill a raw byte buffer holding native-endian f32 samples.
    ///
    /// `dest.len()` is the callback's byte length; a trailing partial sample
    /// is zeroed.
    pub fn render_bytes(&mut self, dest: &mut [u8]) {
        let whole = dest.len() / BYTES_PER_SAMPLE * BYTES_PER_SAMPLE;
        let (body, tail) = dest.split_at_mut(whole);
        tail.fill(0);

        if let Ok(samples) = bytemuck::try_cast_slice_mut::<u8, f32>(body) {
            self.render(samples);
            return;
        }

        // Misaligned: bounce through a stack buffer.
        let mut scratch = [0.0f32; UNALIGNED_CHUNK];
        let mut requested = 0;
        let mut delivered = 0;
        for chunk in body.chunks_mut(UNALIGNED_CHUNK * BYTES_PER_SAMPLE) {
            let count = chunk.len() / BYTES_PER_SAMPLE;
            delivered += self.consumer.read(&mut scratch[..count]);
            requested += count;
            for (bytes, sample) in chunk
                .chunks_exact_mut(BYTES_PER_SAMPLE)
                .zip(&scratch[..count])
            {
                bytes.copy_from_slice(&sample.to_ne_bytes());
            }
        }
        self.stats.record_callback(requested, delivered);
    }

    /// Racy snapshot of samples waiting in the ring.
    pub fn buffered(&self) -> usize {
        self.consumer.len()
    }
}

impl std::fmt::Debug for AudioCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioCallback")
            .field("consumer", &self.consumer)
            .finish()
    }
}
