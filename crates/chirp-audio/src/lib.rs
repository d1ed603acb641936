//! Chirp Audio - Sound-effect synthesis and real-time delivery
//!
//! Renders sound effects on the game thread and streams them to the device
//! callback thread without locks.
//!
//! Architecture:
//! - `RingBuffer`: Lock-free SPSC buffer between the game thread and the audio callback
//! - `Synthesizer`: Fixed channel array of oscillators with ADSR envelopes
//! - `MusicPlayer`: Looping step sequencer, mixed like the synthesizer
//! - `MasterBus`: Master volume and `tanh` soft limiter
//! - `AudioDevice`: Platform output (cpal, or a manual headless device)
//! - `AudioEngine`: Top-level orchestrator

pub mod device;
pub mod envelope;
pub mod mixer;
pub mod music;
pub mod ring_buffer;
pub mod sound;
pub mod stats;
pub mod synth;
pub mod waveform;

pub use device::{AudioCallback, AudioDevice, CpalDevice, ManualDevice, ManualDeviceHandle};
pub use envelope::{Adsr, Envelope};
pub use mixer::{soft_limit, MasterBus};
pub use music::{MusicPlayer, Pattern, Step};
pub use ring_buffer::{Consumer, Producer, RingBuffer};
pub use sound::{SoundBank, SoundDef};
pub use stats::{AudioStats, StatsSnapshot};
pub use synth::{Channel, SampleSource, Synthesizer};
pub use waveform::Waveform;

use chirp_core::{AudioConfig, AudioError, NegotiatedFormat, Result};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Audio engine state.
///
/// Constructed once by the application and passed by reference to whatever
/// drives it. Every method runs on the producer (game) thread; the only thing
/// on the device thread is the [`AudioCallback`] handed over in
/// [`AudioEngine::initialize`].
pub struct AudioEngine {
    /// `None` once the device has been closed.
    device: Option<Box<dyn AudioDevice>>,
    running: bool,
    format: NegotiatedFormat,
    producer: Producer<f32>,
    synth: Synthesizer,
    music: MusicPlayer,
    master: MasterBus,
    /// Per-tick render block, reused across ticks.
    scratch: Vec<f32>,
    stats: Arc<AudioStats>,
}

impl AudioEngine {
    /// Negotiate and open `device`, size the ring from the negotiated
    /// format, and leave the stream paused.
    ///
    /// On error the caller should carry on without sound.
    pub fn initialize<D>(config: &AudioConfig, device: D) -> Result<Self>
    where
        D: AudioDevice + 'static,
    {
        config.validate()?;
        let mut device: Box<dyn AudioDevice> = Box::new(device);

        let request = config.stream_request();
        let format = device.negotiate(&request)?;
        if format.sample_rate == 0 || format.channels == 0 || format.buffer_size == 0 {
            return Err(AudioError::Device(format!(
                "device negotiated an unusable format: {}",
                format
            )));
        }
        if format.differs_from(&request) {
            warn!(
                "Device changed the stream format: requested {} Hz/{} ch/{} frames, got {}",
                request.sample_rate, request.channels, request.buffer_size, format
            );
        }

        let capacity = format.ring_capacity(config.effective_ring_multiplier());
        let (producer, consumer) = RingBuffer::new(capacity).split();
        let stats = Arc::new(AudioStats::default());
        device.open(AudioCallback::new(consumer, Arc::clone(&stats)))?;

        info!(
            "Audio engine initialized on {}: {}, ring {} samples (~{:.1} ms)",
            device.name(),
            format,
            capacity,
            format.period_ms() * config.effective_ring_multiplier() as f64
        );

        Ok(Self {
            device: Some(device),
            running: false,
            format,
            producer,
            synth: Synthesizer::new(format.sample_rate, config.noise_seed),
            music: MusicPlayer::new(format.sample_rate, config.noise_seed.wrapping_add(1)),
            master: MasterBus::new(config.master_volume, config.smooth_volume),
            scratch: Vec::with_capacity(format.frames_to_samples(format.buffer_size as usize)),
            stats,
        })
    }

    /// Start the device callback.
    pub fn start(&mut self) -> Result<()> {
        let device = self.device.as_mut().ok_or(AudioError::NotInitialized)?;
        device.resume()?;
        self.running = true;
        info!("Audio playback started");
        Ok(())
    }

    /// Pause the device callback. Queued samples stay in the ring.
    pub fn pause(&mut self) -> Result<()> {
        let device = self.device.as_mut().ok_or(AudioError::NotInitialized)?;
        device.pause()?;
        self.running = false;
        info!("Audio playback paused");
        Ok(())
    }

    /// Check if the device callback is running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Render `frame_count` frames, apply master volume and the limiter, and
    /// queue the block for the device. Returns the samples actually queued;
    /// whatever does not fit in the ring is dropped.
    ///
    /// Call once per game-loop iteration, never from the audio callback.
    pub fn tick(&mut self, frame_count: usize) -> usize {
        let channels = self.format.channels as usize;
        let len = frame_count * channels;
        if self.scratch.len() < len {
            self.scratch.resize(len, 0.0);
        }

        let block = &mut self.scratch[..len];
        block.fill(0.0);
        self.synth.render_samples(block, frame_count, channels);
        self.music.render_samples(block, frame_count, channels);
        self.master.process(block, channels);

        let written = self.producer.write(block);
        let dropped = len - written;
        self.stats.record_tick(dropped);
        if dropped > 0 {
            debug!("Ring full: dropped {} of {} samples", dropped, len);
        }
        trace!(buffered = self.producer.len(), "Audio tick");
        written
    }

    /// Play `sound_id` on SFX `channel`. Invalid arguments are ignored.
    pub fn play_sound(&mut self, channel: usize, sound_id: u32) {
        self.synth.play_sound(channel, sound_id);
    }

    /// Stop SFX `channel`, fading over its release segment if it has one.
    pub fn stop_channel(&mut self, channel: usize) {
        self.synth.stop_channel(channel);
    }

    /// Replace the sound table used by both the SFX channels and music.
    pub fn set_sound_bank(&mut self, bank: SoundBank) {
        info!("Loaded sound bank with {} sounds", bank.len());
        self.music.set_bank(bank.clone());
        self.synth.set_bank(bank);
    }

    /// Start looping `pattern` on the music channels.
    pub fn play_music(&mut self, pattern: Pattern) {
        self.music.play(pattern);
    }

    /// Stop music and silence its channels.
    pub fn stop_music(&mut self) {
        self.music.stop();
    }

    /// Set master volume, clamped to `[0, 1]`. Applies from the next tick.
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master.set_volume(volume);
    }

    /// Current master volume.
    pub fn master_volume(&self) -> f32 {
        self.master.volume()
    }

    /// The SFX synthesizer.
    pub fn synthesizer(&self) -> &Synthesizer {
        &self.synth
    }

    /// Mutable access to the SFX synthesizer.
    pub fn synthesizer_mut(&mut self) -> &mut Synthesizer {
        &mut self.synth
    }

    /// The music player.
    pub fn music(&self) -> &MusicPlayer {
        &self.music
    }

    /// The format the device actually opened with.
    pub fn format(&self) -> NegotiatedFormat {
        self.format
    }

    /// Negotiated sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    /// Negotiated interleaved channel count.
    pub fn channels(&self) -> u16 {
        self.format.channels
    }

    /// Callback period in frames as reported by the device.
    pub fn callback_buffer_size(&self) -> u32 {
        self.format.buffer_size
    }

    /// Ring capacity in samples (one slot is never filled).
    pub fn ring_capacity(&self) -> usize {
        self.producer.capacity()
    }

    /// Racy snapshot of samples queued for the device.
    pub fn buffered_samples(&self) -> usize {
        self.producer.len()
    }

    /// Snapshot of the underrun/overflow counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Pause and close the device, then release the ring and synthesizer.
    pub fn shutdown(mut self) {
        self.close_device();
        // Remaining fields drop here, after the callback is gone.
    }

    fn close_device(&mut self) {
        let Some(mut device) = self.device.take() else {
            return;
        };
        if self.running {
            if let Err(e) = device.pause() {
                warn!("Failed to pause audio device during shutdown: {}", e);
            }
        }
        device.close();
        self.running = false;
        info!("Audio engine shut down");
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.close_device();
    }
}

impl std::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEngine")
            .field("format", &self.format)
            .field("running", &self.running)
            .field("master_volume", &self.master.volume())
            .field("producer", &self.producer)
            .finish()
    }
}
