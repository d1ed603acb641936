//! Looping step-sequence music player.
//!
//! Not a tracker: a pattern is a list of steps at a fixed rate, each step
//! optionally triggering one sound id per music channel. The player renders
//! through its own small [`Synthesizer`] and implements [`SampleSource`], so
//! the engine mixes it exactly like the SFX synthesizer.

use chirp_core::limits::MUSIC_CHANNELS;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::sound::SoundBank;
use crate::synth::{SampleSource, Synthesizer};

/// Sound ids to trigger on one step, one slot per music channel.
pub type Step = [Option<u32>; MUSIC_CHANNELS];

/// A looping sequence of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// Step rate in steps per second.
    pub steps_per_second: f32,
    pub steps: Vec<Step>,
}

impl Pattern {
    /// A pattern advancing `steps_per_second` steps per second.
    pub fn new(steps_per_second: f32, steps: Vec<Step>) -> Self {
        Self {
            steps_per_second,
            steps,
        }
    }

    /// Frames per step at `sample_rate`, never zero.
    pub fn step_frames(&self, sample_rate: u32) -> usize {
        if !(self.steps_per_second.is_finite() && self.steps_per_second > 0.0) {
            return sample_rate.max(1) as usize;
        }
        ((sample_rate as f32 / self.steps_per_second).round() as usize).max(1)
    }
}

/// Plays a [`Pattern`] in a loop.
#[derive(Debug)]
pub struct MusicPlayer {
    synth: Synthesizer,
    pattern: Option<Pattern>,
    step_index: usize,
    step_frames: usize,
    frames_until_step: usize,
}

impl MusicPlayer {
    /// Create an idle player with its own music channels.
    pub fn new(sample_rate: u32, noise_seed: u64) -> Self {
        Self {
            synth: Synthesizer::with_channels(sample_rate, MUSIC_CHANNELS, noise_seed),
            pattern: None,
            step_index: 0,
            step_frames: 0,
            frames_until_step: 0,
        }
    }

    /// Replace the sound table the steps refer to.
    pub fn set_bank(&mut self, bank: SoundBank) {
        self.synth.set_bank(bank);
    }

    /// Start `pattern` from its first step. An empty pattern stops playback.
    pub fn play(&mut self, pattern: Pattern) {
        self.synth.stop_all();
        if pattern.steps.is_empty() {
            self.pattern = None;
            return;
        }
        self.step_frames = pattern.step_frames(self.synth.sample_rate());
        self.step_index = 0;
        self.frames_until_step = 0;
        info!(
            "Music started: {} steps, {} frames/step",
            pattern.steps.len(),
            self.step_frames
        );
        self.pattern = Some(pattern);
    }

    /// Stop playback and silence every music channel.
    pub fn stop(&mut self) {
        self.pattern = None;
        self.synth.stop_all();
    }

    /// Whether a pattern is playing.
    pub fn is_playing(&self) -> bool {
        self.pattern.is_some()
    }

    /// Index of the step that will trigger next.
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    fn trigger_step(&mut self) {
        let Some(pattern) = &self.pattern else {
            return;
        };
        let step = pattern.steps[self.step_index];
        self.step_index = (self.step_index + 1) % pattern.steps.len();
        for (channel, sound) in step.iter().enumerate() {
            if let Some(id) = sound {
                self.synth.play_sound(channel, *id);
            }
        }
    }
}

impl SampleSource for MusicPlayer {
    fn render_samples(&mut self, buffer: &mut [f32], frame_count: usize, channels: usize) {
        if channels == 0 {
            return;
        }
        let frames = frame_count.min(buffer.len() / channels);
        if self.pattern.is_none() {
            // Let tails of the last notes ring out.
            self.synth.render_samples(buffer, frames, channels);
            return;
        }

        let mut done = 0;
        while done < frames {
            if self.frames_until_step == 0 {
                self.trigger_step();
                self.frames_until_step = self.step_frames;
            }
            let n = (frames - done).min(self.frames_until_step);
            let block = &mut buffer[done * channels..(done + n) * channels];
            self.synth.render_samples(block, n, channels);
            done += n;
            self.frames_until_step -= n;
        }
    }
}
