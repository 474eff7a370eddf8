//! Receive-only pipeline diagnostics: atomic stage counters plus running
//! confidence/level statistics (adapted from `diagnostics/metrics.rs`'s
//! style, generalized from its EVM/SNR/BER helpers to the counters a
//! receive-only pipeline actually produces per spec §8).

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated from any pipeline thread; cheap enough to
/// bump on every frame without contending a mutex.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub bursts_detected: AtomicU64,
    pub bursts_squelched: AtomicU64,
    pub detector_underruns: AtomicU64,
    pub downmix_rejections: AtomicU64,
    pub demod_rejections: AtomicU64,
    pub decode_rejections: AtomicU64,
    pub frames_decoded: AtomicU64,
    pub queue_drops: AtomicU64,

    confidence_sum_centipct: AtomicU64,
    confidence_count: AtomicU64,
    level_sum_milli: AtomicU64,
    level_count: AtomicU64,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_burst_detected(&self) {
        self.bursts_detected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_burst_squelched(&self) {
        self.bursts_squelched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detector_underrun(&self) {
        self.detector_underruns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_detector_underruns(&self, n: u64) {
        if n > 0 {
            self.detector_underruns.fetch_add(n, Ordering::Relaxed);
        }
    }

    pub fn record_downmix_rejection(&self) {
        self.downmix_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_demod_rejection(&self) {
        self.demod_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_rejection(&self) {
        self.decode_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_queue_drop(&self) {
        self.queue_drops.fetch_add(1, Ordering::Relaxed);
    }

    /// `confidence_pct` in `[0, 100]`, `level` the demodulator's mean symbol
    /// magnitude. Stored as fixed-point (centi-percent / milli-units) so the
    /// running mean can use plain atomics instead of a mutexed `f64`.
    pub fn record_demod_frame(&self, confidence_pct: f64, level: f64) {
        self.frames_decoded.fetch_add(1, Ordering::Relaxed);
        self.confidence_sum_centipct
            .fetch_add((confidence_pct * 100.0).round() as u64, Ordering::Relaxed);
        self.confidence_count.fetch_add(1, Ordering::Relaxed);
        self.level_sum_milli
            .fetch_add((level * 1000.0).round() as u64, Ordering::Relaxed);
        self.level_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mean_confidence_pct(&self) -> f64 {
        let count = self.confidence_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.confidence_sum_centipct.load(Ordering::Relaxed) as f64 / count as f64 / 100.0
    }

    pub fn mean_level(&self) -> f64 {
        let count = self.level_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.level_sum_milli.load(Ordering::Relaxed) as f64 / count as f64 / 1000.0
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            bursts_detected: self.bursts_detected.load(Ordering::Relaxed),
            bursts_squelched: self.bursts_squelched.load(Ordering::Relaxed),
            detector_underruns: self.detector_underruns.load(Ordering::Relaxed),
            downmix_rejections: self.downmix_rejections.load(Ordering::Relaxed),
            demod_rejections: self.demod_rejections.load(Ordering::Relaxed),
            decode_rejections: self.decode_rejections.load(Ordering::Relaxed),
            frames_decoded: self.frames_decoded.load(Ordering::Relaxed),
            queue_drops: self.queue_drops.load(Ordering::Relaxed),
            mean_confidence_pct: self.mean_confidence_pct(),
            mean_level: self.mean_level(),
        }
    }
}

/// A point-in-time, non-atomic copy of [`Diagnostics`] suitable for logging
/// or exposing over an external status interface.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticsSnapshot {
    pub bursts_detected: u64,
    pub bursts_squelched: u64,
    pub detector_underruns: u64,
    pub downmix_rejections: u64,
    pub demod_rejections: u64,
    pub decode_rejections: u64,
    pub frames_decoded: u64,
    pub queue_drops: u64,
    pub mean_confidence_pct: f64,
    pub mean_level: f64,
}
