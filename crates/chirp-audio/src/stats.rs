//! Diagnostic counters shared by the producer and the device callback.
//!
//! All counters are relaxed atomics: they order nothing and are only read
//! for metering.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct AudioStats {
    callbacks: AtomicU64,
    underruns: AtomicU64,
    underrun_samples: AtomicU64,
    dropped_samples: AtomicU64,
    ticks: AtomicU64,
}

impl AudioStats {
    /// Record one callback that asked for `requested` and got `delivered`.
    #[inline]
    pub fn record_callback(&self, requested: usize, delivered: usize) {
        self.callbacks.fetch_add(1, Ordering::Relaxed);
        if delivered < requested {
            self.underruns.fetch_add(1, Ordering::Relaxed);
            self.underrun_samples
                .fetch_add((requested - delivered) as u64, Ordering::Relaxed);
        }
    }

    /// Record one producer tick that lost `dropped` samples to overflow.
    #[inline]
    pub fn record_tick(&self, dropped: usize) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        if dropped > 0 {
            self.dropped_samples
                .fetch_add(dropped as u64, Ordering::Relaxed);
        }
    }

    /// Read every counter. Individual loads, not one atomic snapshot.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            callbacks: self.callbacks.load(Ordering::Relaxed),
            underruns: self.underruns.load(Ordering::Relaxed),
            underrun_samples: self.underrun_samples.load(Ordering::Relaxed),
            dropped_samples: self.dropped_samples.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`AudioStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub callbacks: u64,
    /// Callbacks that had to pad with silence.
    pub underruns: u64,
    /// Total silence samples padded in.
    pub underrun_samples: u64,
    /// Samples the producer could not fit in the ring.
    pub dropped_samples: u64,
    pub ticks: u64,
}
