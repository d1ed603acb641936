//! ADSR amplitude envelopes.
//!
//! Sound definitions describe envelopes in seconds ([`Adsr`]); channels carry
//! them converted to frames ([`Envelope`]) at the negotiated sample rate.

use serde::{Deserialize, Serialize};

/// Attack/decay/release in seconds, sustain as a level in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for Adsr {
    /// The neutral envelope: full level for the whole duration.
    fn default() -> Self {
        Self {
            attack: 0.0,
            decay: 0.0,
            sustain: 1.0,
            release: 0.0,
        }
    }
}

impl Adsr {
    /// Clamp to sane values and make the timed segments fit in `duration`
    /// seconds, scaling them down proportionally when they overflow.
    pub fn fitted(self, duration: f32) -> Self {
        let attack = finite_or(self.attack, 0.0).max(0.0);
        let decay = finite_or(self.decay, 0.0).max(0.0);
        let release = finite_or(self.release, 0.0).max(0.0);
        let sustain = finite_or(self.sustain, 1.0).clamp(0.0, 1.0);
        let duration = finite_or(duration, 0.0).max(0.0);

        let timed = attack + decay + release;
        let scale = if timed > duration && timed > 0.0 {
            duration / timed
        } else {
            1.0
        };

        Self {
            attack: attack * scale,
            decay: decay * scale,
            sustain,
            release: release * scale,
        }
    }

    /// Convert to an [`Envelope`] measured in frames.
    pub fn to_frames(self, sample_rate: u32) -> Envelope {
        let rate = sample_rate as f32;
        Envelope {
            attack: (self.attack * rate).round(),
            decay: (self.decay * rate).round(),
            sustain: self.sustain,
            release: (self.release * rate).round(),
        }
    }
}

/// `value`, or `fallback` when it is NaN or infinite.
#[inline]
pub(crate) fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// An ADSR envelope with segment lengths in frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Envelope {
    /// Level at elapsed time `t` of a sound lasting `duration` (all in frames).
    ///
    /// Zero-length segments are skipped, so the level jumps straight to the
    /// next segment's starting value instead of dividing by zero.
    pub fn level(&self, t: f32, duration: f32) -> f32 {
        if t < self.attack {
            return t / self.attack;
        }
        let decay_end = self.attack + self.decay;
        if t < decay_end {
            return 1.0 - (t - self.attack) / self.decay * (1.0 - self.sustain);
        }
        let release_start = duration - self.release;
        if t < release_start {
            return self.sustain;
        }
        if self.release <= 0.0 {
            return 0.0;
        }
        let level = self.sustain * (1.0 - (t - release_start) / self.release);
        level.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(attack: f32, decay: f32, sustain: f32, release: f32) -> Envelope {
        Envelope {
            attack,
            decay,
            sustain,
            release,
        }
    }

    #[test]
    fn test_degenerate_envelope_is_flat() {
        let e = env(0.0, 0.0, 1.0, 0.0);
        for t in 0..1000 {
            assert_eq!(e.level(t as f32, 1000.0), 1.0);
        }
    }

    #[test]
    fn test_attack_ramp() {
        let e = env(100.0, 0.0, 1.0, 0.0);
        assert_eq!(e.level(0.0, 1000.0), 0.0);
        assert!((e.level(50.0, 1000.0) - 0.5).abs() < 1e-6);
        assert_eq!(e.level(100.0, 1000.0), 1.0);
    }

    #[test]
    fn test_decay_to_sustain() {
        let e = env(0.0, 100.0, 0.5, 0.0);
        assert_eq!(e.level(0.0, 1000.0), 1.0);
        assert!((e.level(50.0, 1000.0) - 0.75).abs() < 1e-6);
        assert_eq!(e.level(100.0, 1000.0), 0.5);
        assert_eq!(e.level(500.0, 1000.0), 0.5);
    }

    #[test]
    fn test_release_to_zero() {
        let e = env(0.0, 0.0, 0.8, 200.0);
        assert_eq!(e.level(799.0, 1000.0), 0.8);
        assert!((e.level(900.0, 1000.0) - 0.4).abs() < 1e-6);
        assert!(e.level(1000.0, 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_attack_starts_at_peak() {
        let e = env(0.0, 10.0, 0.2, 0.0);
        assert_eq!(e.level(0.0, 100.0), 1.0);
    }

    #[test]
    fn test_levels_are_finite_and_bounded() {
        let e = env(3.0, 7.0, 0.6, 5.0);
        for t in 0..=30 {
            let l = e.level(t as f32, 30.0);
            assert!(l.is_finite());
            assert!((0.0..=1.0).contains(&l), "t={t} level={l}");
        }
    }

    #[test]
    fn test_fitted_scales_overlong_segments() {
        let adsr = Adsr {
            attack: 1.0,
            decay: 1.0,
            sustain: 2.0,
            release: 2.0,
        }
        .fitted(2.0);
        assert!((adsr.attack + adsr.decay + adsr.release - 2.0).abs() < 1e-6);
        assert_eq!(adsr.sustain, 1.0);
    }

    #[test]
    fn test_fitted_replaces_non_finite_values() {
        let adsr = Adsr {
            attack: f32::INFINITY,
            decay: f32::NAN,
            sustain: f32::NAN,
            release: 0.1,
        }
        .fitted(1.0);
        assert_eq!(adsr.attack, 0.0);
        assert_eq!(adsr.decay, 0.0);
        assert_eq!(adsr.sustain, 1.0);
        assert!((adsr.release - 0.1).abs() < 1e-6);

        let e = adsr.to_frames(1000);
        for t in 0..1000 {
            assert!(e.level(t as f32, 1000.0).is_finite());
        }
    }

    #[test]
    fn test_to_frames() {
        let e = Adsr {
            attack: 0.01,
            decay: 0.02,
            sustain: 0.5,
            release: 0.1,
        }
        .to_frames(44100);
        assert_eq!(e.attack, 441.0);
        assert_eq!(e.decay, 882.0);
        assert_eq!(e.release, 4410.0);
    }
}
