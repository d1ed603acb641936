//! Master bus: master volume and the protective soft limiter.
//!
//! Runs on the producer thread over each rendered block, after all sources
//! have been summed and before the block is handed to the ring buffer.

/// Saturate samples outside `[-1, 1]` with `tanh`; pass the rest through.
#[inline]
pub fn soft_limit(sample: f32) -> f32 {
    if sample.abs() > 1.0 {
        sample.tanh()
    } else {
        sample
    }
}

/// Master gain stage.
#[derive(Debug, Clone)]
pub struct MasterBus {
    /// Target master volume (0.0 to 1.0).
    volume: f32,
    /// Volume applied at the end of the previous block.
    applied: f32,
    /// Ramp from `applied` to `volume` across a block instead of stepping.
    pub smooth: bool,
}

impl Default for MasterBus {
    fn default() -> Self {
        Self::new(1.0, false)
    }
}

impl MasterBus {
    /// Create a bus at `volume` (clamped). `smooth` enables the per-block ramp.
    pub fn new(volume: f32, smooth: bool) -> Self {
        let volume = clamp_volume(volume);
        Self {
            volume,
            applied: volume,
            smooth,
        }
    }

    /// Set the master volume, clamped to `[0, 1]`. Takes effect on the next
    /// processed block.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_volume(volume);
    }

    /// Target master volume.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Apply volume and the limiter to an interleaved block in place.
    pub fn process(&mut self, block: &mut [f32], channels: usize) {
        let target = self.volume;
        if self.smooth && self.applied != target && channels > 0 {
            let frames = block.len() / channels;
            let start = self.applied;
            let delta = (target - start) / frames.max(1) as f32;
            for (i, frame) in block.chunks_mut(channels).enumerate() {
                let gain = start + delta * (i + 1) as f32;
                for s in frame.iter_mut() {
                    *s = soft_limit(*s * gain);
                }
            }
        } else {
            for s in block.iter_mut() {
                *s = soft_limit(*s * target);
            }
        }
        self.applied = target;
    }
}

/// NaN maps to silence; everything else is clamped to `[0, 1]`.
fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_passes_safe_range() {
        for x in [-1.0f32, -0.5, 0.0, 0.3, 1.0] {
            assert_eq!(soft_limit(x), x);
        }
    }

    #[test]
    fn test_limiter_saturates_overs() {
        for x in [1.0001f32, 2.0, -3.0, 100.0] {
            let y = soft_limit(x);
            assert_eq!(y, x.tanh());
            assert!(y.abs() <= 1.0);
            assert_eq!(y.signum(), x.signum());
        }
    }

    #[test]
    fn test_volume_clamped() {
        let mut bus = MasterBus::default();
        bus.set_volume(1.5);
        assert_eq!(bus.volume(), 1.0);
        bus.set_volume(-0.2);
        assert_eq!(bus.volume(), 0.0);
        bus.set_volume(f32::NAN);
        assert_eq!(bus.volume(), 0.0);
    }

    #[test]
    fn test_volume_is_constant_within_block() {
        let mut bus = MasterBus::new(1.0, false);
        bus.set_volume(0.5);
        let mut block = vec![0.8f32; 16];
        bus.process(&mut block, 2);
        assert!(block.iter().all(|&s| (s - 0.4).abs() < 1e-6));
    }

    #[test]
    fn test_limiter_after_gain() {
        let mut bus = MasterBus::new(1.0, false);
        let mut block = vec![2.0f32, -2.0, 0.9, -0.9];
        bus.process(&mut block, 2);
        assert_eq!(block[0], 2.0f32.tanh());
        assert_eq!(block[1], (-2.0f32).tanh());
        assert_eq!(block[2], 0.9);
    }

    #[test]
    fn test_smooth_ramp_reaches_target() {
        let mut bus = MasterBus::new(1.0, true);
        bus.set_volume(0.0);
        let mut block = vec![1.0f32; 8];
        bus.process(&mut block, 2);
        // Monotonically decreasing, ending at zero.
        for pair in block.chunks(2).collect::<Vec<_>>().windows(2) {
            assert!(pair[0][0] > pair[1][0]);
        }
        assert_eq!(block[7], 0.0);

        // Next block holds the target.
        let mut next = vec![1.0f32; 4];
        bus.process(&mut next, 2);
        assert!(next.iter().all(|&s| s == 0.0));
    }
}
