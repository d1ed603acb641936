//! Built-in demo content: a small sound bank, a music loop and a scripted
//! sequence of sound triggers standing in for game logic.

use chirp_audio::{Adsr, AudioEngine, Pattern, SoundBank, SoundDef, Waveform};
use chirp_core::limits::MUSIC_CHANNELS;
use chirp_core::Result;

pub const SFX_COIN: u32 = 0;
pub const SFX_JUMP: u32 = 1;
pub const SFX_HIT: u32 = 2;
pub const SFX_LASER: u32 = 3;
pub const MUSIC_BASS: u32 = 10;
pub const MUSIC_LEAD: u32 = 11;

/// The sounds the demo uses.
pub fn demo_bank() -> Result<SoundBank> {
    let mut bank = SoundBank::new();
    bank.insert(
        SFX_COIN,
        SoundDef::tone(Waveform::Square, 987.8, 0.4, 0.15).with_envelope(Adsr {
            attack: 0.0,
            decay: 0.05,
            sustain: 0.6,
            release: 0.05,
        }),
    )?;
    bank.insert(
        SFX_JUMP,
        SoundDef::tone(Waveform::Triangle, 392.0, 0.6, 0.2).with_envelope(Adsr {
            attack: 0.01,
            decay: 0.05,
            sustain: 0.5,
            release: 0.1,
        }),
    )?;
    bank.insert(
        SFX_HIT,
        SoundDef::tone(Waveform::Noise, 0.0, 0.5, 0.25).with_envelope(Adsr {
            attack: 0.0,
            decay: 0.1,
            sustain: 0.2,
            release: 0.1,
        }),
    )?;
    bank.insert(SFX_LASER, SoundDef::tone(Waveform::Sawtooth, 1320.0, 0.3, 0.1))?;
    bank.insert(
        MUSIC_BASS,
        SoundDef::tone(Waveform::Triangle, 110.0, 0.5, 0.2).with_envelope(Adsr {
            attack: 0.005,
            decay: 0.05,
            sustain: 0.7,
            release: 0.05,
        }),
    )?;
    bank.insert(
        MUSIC_LEAD,
        SoundDef::tone(Waveform::Sine, 440.0, 0.25, 0.1).with_envelope(Adsr {
            attack: 0.01,
            decay: 0.02,
            sustain: 0.8,
            release: 0.04,
        }),
    )?;
    Ok(bank)
}

/// A four-step bass/lead loop at 8 steps per second.
pub fn demo_pattern() -> Pattern {
    let rest = [None; MUSIC_CHANNELS];
    let mut bass = rest;
    bass[0] = Some(MUSIC_BASS);
    let mut both = bass;
    both[1] = Some(MUSIC_LEAD);
    Pattern::new(8.0, vec![both, rest, bass, rest])
}

/// A scripted trigger: on `tick`, play `sound` on `channel`.
#[derive(Debug, Clone, Copy)]
struct Cue {
    tick: u64,
    channel: usize,
    sound: u32,
}

/// Replays a fixed list of cues, the way a game script would call
/// `play_sound` from its update.
#[derive(Debug)]
pub struct DemoScript {
    cues: Vec<Cue>,
    next: usize,
}

impl DemoScript {
    /// Build the cue list with ticks at `fps` updates per second.
    pub fn new(fps: u32) -> Self {
        // (seconds, channel, sound)
        let timeline = [
            (0.25, 0, SFX_JUMP),
            (0.6, 1, SFX_COIN),
            (0.7, 1, SFX_COIN),
            (1.0, 2, SFX_LASER),
            (1.1, 2, SFX_LASER),
            (1.5, 3, SFX_HIT),
            (2.0, 0, SFX_JUMP),
        ];
        let cues = timeline
            .into_iter()
            .map(|(seconds, channel, sound): (f32, usize, u32)| Cue {
                tick: (seconds * fps as f32) as u64,
                channel,
                sound,
            })
            .collect();
        Self { cues, next: 0 }
    }

    /// Fire every cue due at or before `tick`.
    pub fn update(&mut self, tick: u64, engine: Option<&mut AudioEngine>) {
        let Some(engine) = engine else {
            self.next = self.cues.partition_point(|c| c.tick <= tick);
            return;
        };
        while let Some(cue) = self.cues.get(self.next) {
            if cue.tick > tick {
                break;
            }
            engine.play_sound(cue.channel, cue.sound);
            self.next += 1;
        }
    }

    /// Whether every cue has fired.
    pub fn finished(&self) -> bool {
        self.next >= self.cues.len()
    }
}
