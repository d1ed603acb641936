//! Channel-based sound-effect synthesizer.
//!
//! A fixed array of plain-data channels, each an oscillator with an optional
//! ADSR envelope. Playing a sound overwrites a channel by index; there is no
//! voice allocation and nothing on the render path allocates.

use chirp_core::limits;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use tracing::{debug, trace};

use crate::envelope::Envelope;
use crate::sound::{SoundBank, SoundDef};
use crate::waveform::{wrap_phase, Waveform};

/// Anything that can add interleaved audio into a block.
///
/// Implementors accumulate into `buffer` (they never clear it), writing the
/// same value to each of the `channels` interleaved outputs of a frame.
pub trait SampleSource {
    fn render_samples(&mut self, buffer: &mut [f32], frame_count: usize, channels: usize);
}

/// Fade-out in progress after an explicit stop.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Release {
    /// Envelope level when the stop arrived.
    level: f32,
    /// Release length in frames.
    length: u32,
}

/// State of one synthesizer voice.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Channel {
    pub active: bool,
    pub waveform: Waveform,
    /// Oscillator phase in `[0, 1)`.
    pub phase: f32,
    /// Frequency in Hz.
    pub frequency: f32,
    /// Peak amplitude (0.0 to 1.0).
    pub amplitude: f32,
    /// Frames left before the channel goes inactive.
    pub remaining: u32,
    elapsed: u32,
    duration: u32,
    envelope: Option<Envelope>,
    release: Option<Release>,
}

impl Channel {
    /// Start a sound on this channel, resetting phase and envelope.
    fn start(&mut self, sound: &SoundDef, sample_rate: u32) {
        let duration = sound.duration_frames(sample_rate);
        *self = Self {
            active: duration > 0,
            waveform: sound.waveform,
            phase: 0.0,
            frequency: sound.frequency,
            amplitude: sound.amplitude,
            remaining: duration,
            elapsed: 0,
            duration,
            envelope: sound.envelope.map(|adsr| adsr.to_frames(sample_rate)),
            release: None,
        };
    }

    /// Current envelope multiplier.
    #[inline]
    fn envelope_level(&self) -> f32 {
        if let Some(release) = self.release {
            return release.level * self.remaining as f32 / release.length as f32;
        }
        match self.envelope {
            Some(env) => env.level(self.elapsed as f32, self.duration as f32),
            None => 1.0,
        }
    }

    /// Stop now, or fade over the envelope's release if it has one.
    fn stop(&mut self) {
        // A second stop while fading keeps the fade going.
        if !self.active || self.release.is_some() {
            return;
        }
        let release_frames = self
            .envelope
            .map(|env| env.release as u32)
            .unwrap_or(0)
            .min(self.remaining);
        if release_frames == 0 {
            self.hard_stop();
            return;
        }
        self.release = Some(Release {
            level: self.envelope_level(),
            length: release_frames,
        });
        self.remaining = release_frames;
    }

    fn hard_stop(&mut self) {
        self.active = false;
        self.remaining = 0;
        self.release = None;
    }

    /// Whether an explicit stop is fading this channel out.
    pub fn is_releasing(&self) -> bool {
        self.release.is_some()
    }

    /// Frames rendered since the sound started.
    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    /// Mix up to `frames` frames of this channel into `buffer`.
    #[inline]
    fn render(
        &mut self,
        buffer: &mut [f32],
        frames: usize,
        channels: usize,
        sample_rate: f32,
        rng: &mut Pcg32,
    ) {
        let step = self.frequency / sample_rate;
        for frame in buffer.chunks_exact_mut(channels).take(frames) {
            if self.remaining == 0 {
                self.hard_stop();
                return;
            }

            let value =
                self.waveform.sample(self.phase, rng) * self.envelope_level() * self.amplitude;
            for sample in frame.iter_mut() {
                *sample += value;
            }

            self.phase = wrap_phase(self.phase + step);
            self.elapsed = self.elapsed.saturating_add(1);
            self.remaining -= 1;
            if self.remaining == 0 {
                self.hard_stop();
                return;
            }
        }
    }
}

/// Fixed-voice oscillator bank driven by a [`SoundBank`].
#[derive(Debug)]
pub struct Synthesizer {
    sample_rate: u32,
    channels: Box<[Channel]>,
    bank: SoundBank,
    rng: Pcg32,
}

impl Synthesizer {
    /// Create a synthesizer with the standard SFX channel count.
    pub fn new(sample_rate: u32, noise_seed: u64) -> Self {
        Self::with_channels(sample_rate, limits::SFX_CHANNELS, noise_seed)
    }

    /// Create a synthesizer with `voices` channels, all inactive.
    pub fn with_channels(sample_rate: u32, voices: usize, noise_seed: u64) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            channels: vec![Channel::default(); voices].into_boxed_slice(),
            bank: SoundBank::new(),
            rng: Pcg32::seed_from_u64(noise_seed),
        }
    }

    /// Sample rate the oscillators step at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of voices.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// The sound table used by `play_sound`.
    pub fn bank(&self) -> &SoundBank {
        &self.bank
    }

    /// Mutable access to the sound table.
    pub fn bank_mut(&mut self) -> &mut SoundBank {
        &mut self.bank
    }

    /// Replace the sound table. Playing channels keep their parameters.
    pub fn set_bank(&mut self, bank: SoundBank) {
        self.bank = bank;
    }

    /// Play `sound_id` on `channel`, replacing whatever was there.
    /// Unknown ids and out-of-range channels are ignored.
    pub fn play_sound(&mut self, channel: usize, sound_id: u32) {
        let Some(sound) = self.bank.get(sound_id).copied() else {
            trace!("Ignoring unknown sound id {}", sound_id);
            return;
        };
        self.play(channel, &sound);
    }

    /// Play an explicit definition on `channel`, bypassing the bank.
    pub fn play(&mut self, channel: usize, sound: &SoundDef) {
        let sample_rate = self.sample_rate;
        let Some(slot) = self.channels.get_mut(channel) else {
            trace!("Ignoring play on out-of-range channel {}", channel);
            return;
        };
        if slot.active {
            debug!("Channel {} stolen by new sound", channel);
        }
        slot.start(&sound.sanitized(), sample_rate);
    }

    /// Stop `channel`. If its envelope has a release segment the channel
    /// fades out over it; otherwise it goes silent immediately.
    pub fn stop_channel(&mut self, channel: usize) {
        if let Some(slot) = self.channels.get_mut(channel) {
            slot.stop();
        }
    }

    /// Silence every channel immediately.
    pub fn stop_all(&mut self) {
        for channel in self.channels.iter_mut() {
            channel.hard_stop();
        }
    }

    /// Check if `channel` is producing sound. Out-of-range channels are not.
    pub fn is_active(&self, channel: usize) -> bool {
        self.channels.get(channel).is_some_and(|c| c.active)
    }

    /// Voice state for `channel`, if it exists.
    pub fn channel(&self, channel: usize) -> Option<&Channel> {
        self.channels.get(channel)
    }

    /// Number of channels currently producing sound.
    pub fn active_channel_count(&self) -> usize {
        self.channels.iter().filter(|c| c.active).count()
    }
}

impl SampleSource for Synthesizer {
    /// Mix `frame_count` frames of every active channel into `buffer`,
    /// replicating the mono voice sum to all `channels` outputs.
    fn render_samples(&mut self, buffer: &mut [f32], frame_count: usize, channels: usize) {
        if channels == 0 {
            return;
        }
        let frames = frame_count.min(buffer.len() / channels);
        let sample_rate = self.sample_rate as f32;
        let rng = &mut self.rng;
        for channel in self.channels.iter_mut().filter(|c| c.active) {
            channel.render(buffer, frames, channels, sample_rate, rng);
        }
    }
}
