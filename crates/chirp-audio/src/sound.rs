//! Sound-effect definitions and the id → definition table.

use chirp_core::{AudioError, Result};
use serde::{Deserialize, Serialize};

use crate::envelope::{finite_or, Adsr};
use crate::waveform::Waveform;

/// Largest sound id a bank accepts.
pub const MAX_SOUND_ID: u32 = 4095;

/// Parameters of one sound effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundDef {
    pub waveform: Waveform,
    /// Oscillator frequency in Hz.
    pub frequency: f32,
    /// Peak amplitude (0.0 to 1.0).
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
    /// Length in seconds.
    pub duration: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope: Option<Adsr>,
}

fn default_amplitude() -> f32 {
    1.0
}

impl SoundDef {
    /// A plain tone with no envelope.
    pub fn tone(waveform: Waveform, frequency: f32, amplitude: f32, duration: f32) -> Self {
        Self {
            waveform,
            frequency,
            amplitude,
            duration,
            envelope: None,
        }
        .sanitized()
    }

    /// Attach an ADSR envelope, fitted to the sound's duration.
    pub fn with_envelope(mut self, envelope: Adsr) -> Self {
        self.envelope = Some(envelope);
        self.sanitized()
    }

    /// Clamp out-of-range parameters instead of rejecting them.
    pub fn sanitized(self) -> Self {
        let duration = finite_or(self.duration, 0.0).max(0.0);
        Self {
            waveform: self.waveform,
            frequency: finite_or(self.frequency, 0.0).max(0.0),
            amplitude: finite_or(self.amplitude, 0.0).clamp(0.0, 1.0),
            duration,
            envelope: self.envelope.map(|e| e.fitted(duration)),
        }
    }

    /// Duration in frames at `sample_rate`.
    pub fn duration_frames(&self, sample_rate: u32) -> u32 {
        (self.duration * sample_rate as f32).round() as u32
    }
}

/// On-disk shape of a sound bank.
#[derive(Debug, Serialize, Deserialize)]
struct SoundBankFile {
    sounds: Vec<SoundEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SoundEntry {
    id: u32,
    #[serde(flatten)]
    sound: SoundDef,
}

/// Lookup table from sound id to definition.
///
/// Built on the game thread before playback; lookups never allocate.
#[derive(Debug, Clone, Default)]
pub struct SoundBank {
    sounds: Vec<Option<SoundDef>>,
}

impl SoundBank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the definition for `id`.
    pub fn insert(&mut self, id: u32, sound: SoundDef) -> Result<()> {
        if id > MAX_SOUND_ID {
            return Err(AudioError::InvalidConfig(format!(
                "sound id {} exceeds maximum {}",
                id, MAX_SOUND_ID
            )));
        }
        let index = id as usize;
        if self.sounds.len() <= index {
            self.sounds.resize(index + 1, None);
        }
        self.sounds[index] = Some(sound.sanitized());
        Ok(())
    }

    /// Look up a sound. Unknown ids return `None`.
    #[inline]
    pub fn get(&self, id: u32) -> Option<&SoundDef> {
        self.sounds.get(id as usize).and_then(Option::as_ref)
    }

    /// Remove and return the sound with `id`.
    pub fn remove(&mut self, id: u32) -> Option<SoundDef> {
        self.sounds.get_mut(id as usize).and_then(Option::take)
    }

    /// Number of defined sounds.
    pub fn len(&self) -> usize {
        self.sounds.iter().filter(|s| s.is_some()).count()
    }

    /// Check if no sounds are defined.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parse a bank from JSON: `{ "sounds": [ { "id": 0, "waveform": "square", ... } ] }`.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let file: SoundBankFile = serde_json::from_slice(data)
            .map_err(|e| AudioError::Serialization(format!("Invalid sound bank: {}", e)))?;
        let mut bank = Self::new();
        for entry in file.sounds {
            bank.insert(entry.id, entry.sound)?;
        }
        Ok(bank)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let file = SoundBankFile {
            sounds: self
                .sounds
                .iter()
                .enumerate()
                .filter_map(|(id, s)| {
                    s.map(|sound| SoundEntry {
                        id: id as u32,
                        sound,
                    })
                })
                .collect(),
        };
        serde_json::to_vec_pretty(&file)
            .map_err(|e| AudioError::Serialization(format!("Failed to serialize sound bank: {}", e)))
    }
}
