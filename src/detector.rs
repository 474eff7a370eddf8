//! Stage A: burst detection via sliding FFT with adaptive noise-floor
//! tracking and hysteresis (grounded on
//! `other_examples/unmarshal-iq-slicer`'s noise-floor/threshold shape and
//! `original_source/burst_detect.c`'s exact per-frame algorithm).

use num_complex::Complex32;

use crate::config::ReceiverConfig;
use crate::dsp::{fft_planner, window};
use crate::errors::DetectorError;
use crate::kernels::kernels;
use crate::ring_buffer::RingBuffer;
use crate::types::{ActiveBurst, BurstRecord};

pub struct BurstDetector {
    fft_size: usize,
    pre_roll: usize,
    post_roll: usize,
    burst_width_bins: f64,
    max_bursts: usize,
    max_burst_len: usize,
    history_size: usize,
    threshold_linear: f64,
    capture_center_freq_hz: f64,
    capture_sample_rate_hz: f64,

    window: Vec<f32>,
    ring: RingBuffer,
    pending: Vec<Complex32>,
    current_index: u64,

    baseline_history: Vec<Vec<f32>>,
    baseline_sum: Vec<f64>,
    history_index: usize,
    primed: bool,

    active_bursts: Vec<ActiveBurst>,
    next_burst_id: u64,
    squelch_count: u32,

    pub dropped_underrun: u64,
    pub dropped_queue_full: u64,
}

impl BurstDetector {
    pub fn new(config: &ReceiverConfig) -> Self {
        let fft_size = config.effective_fft_size();
        let pre_roll = config.effective_pre_roll();
        let post_roll = config.effective_post_roll();
        let max_burst_len = config.effective_max_burst_len();
        let max_bursts = config.effective_max_bursts();
        let history_size = config.noise_history_len;
        let bin_width_hz = config.sample_rate_hz / fft_size as f64;
        let burst_width_bins = config.burst_width_hz / bin_width_hz;

        let ring_capacity = (max_burst_len + pre_roll + post_roll + 4 * fft_size)
            .max((2.0 * config.sample_rate_hz) as usize);

        Self {
            fft_size,
            pre_roll,
            post_roll,
            burst_width_bins,
            max_bursts,
            max_burst_len,
            history_size,
            threshold_linear: config.threshold_linear(),
            capture_center_freq_hz: config.center_freq_hz,
            capture_sample_rate_hz: config.sample_rate_hz,
            window: window::blackman_scaled(fft_size),
            ring: RingBuffer::new(ring_capacity),
            pending: Vec::with_capacity(fft_size),
            current_index: 0,
            baseline_history: vec![vec![0.0f32; fft_size]; history_size.max(1)],
            baseline_sum: vec![0.0f64; fft_size],
            history_index: 0,
            primed: false,
            active_bursts: Vec::new(),
            next_burst_id: 0,
            squelch_count: 0,
            dropped_underrun: 0,
            dropped_queue_full: 0,
        }
    }

    /// Feed new samples, writing them into the ring buffer and processing
    /// as many complete FFT-length, non-overlapping frames as are now
    /// available. Returns the bursts that retired during this call.
    pub fn push_samples(&mut self, samples: &[Complex32]) -> Vec<BurstRecord> {
        self.ring.write(samples);
        self.pending.extend_from_slice(samples);

        let mut out = Vec::new();
        while self.pending.len() >= self.fft_size {
            let frame: Vec<Complex32> = self.pending.drain(..self.fft_size).collect();
            out.extend(self.process_frame(&frame));
        }
        out
    }

    fn process_frame(&mut self, frame: &[Complex32]) -> Vec<BurstRecord> {
        self.current_index += self.fft_size as u64;

        // Step 1: window, forward FFT, DC-centered magnitude-squared.
        let mut windowed = vec![Complex32::new(0.0, 0.0); self.fft_size];
        (kernels().window_multiply)(frame, &self.window, &mut windowed);
        let plan = fft_planner::plan(self.fft_size, true);
        plan.process(&mut windowed);
        let mut magnitude = vec![0.0f32; self.fft_size];
        (kernels().fftshift_mag_squared)(&windowed, &mut magnitude);

        // Step 2: relative magnitude, only meaningful once the baseline is primed.
        let mut relative = vec![0.0f64; self.fft_size];
        if self.primed {
            for bin in 0..self.fft_size {
                relative[bin] = if self.baseline_sum[bin] > 0.0 {
                    magnitude[bin] as f64 / self.baseline_sum[bin]
                } else {
                    0.0
                };
            }
        }

        // Step 3: active-burst liveness.
        if self.primed {
            for burst in &mut self.active_bursts {
                let c = burst.center_bin;
                let lo = c.saturating_sub(1);
                let hi = (c + 1).min(self.fft_size - 1);
                if relative[lo] > self.threshold_linear
                    || relative[c] > self.threshold_linear
                    || relative[hi] > self.threshold_linear
                {
                    burst.last_active = self.current_index;
                }
            }
        }

        // Step 4: mask the spectrum around every active burst.
        let half_width = (self.burst_width_bins / 2.0).ceil() as usize;
        for burst in &self.active_bursts {
            mask_bins(&mut relative, burst.center_bin, half_width, self.fft_size);
        }

        // Step 5: extract peaks outside half-width of the FFT edges.
        let mut peaks: Vec<(usize, f64)> = Vec::new();
        if self.primed {
            for bin in half_width..self.fft_size.saturating_sub(half_width) {
                if relative[bin] > self.threshold_linear {
                    peaks.push((bin, relative[bin]));
                }
            }
            peaks.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        }

        // Step 6: retire gone bursts.
        let mut retired = Vec::new();
        let mut forced_baseline_update = false;
        let mut still_active = Vec::new();
        for burst in self.active_bursts.drain(..) {
            let silent = burst.last_active + self.post_roll as u64 <= self.current_index;
            let too_long = self.current_index.saturating_sub(burst.start) > self.max_burst_len as u64;
            if silent || too_long {
                if too_long {
                    forced_baseline_update = true;
                }
                retired.push(burst);
            } else {
                still_active.push(burst);
            }
        }
        self.active_bursts = still_active;

        let mut output = Vec::new();
        for burst in retired {
            match self.emit_burst(&burst) {
                Ok(record) => output.push(record),
                Err(_) => self.dropped_underrun += 1,
            }
        }

        // Step 7: instantiate new bursts from remaining (unmasked) peaks.
        let mut newly_created = Vec::new();
        for (bin, r) in peaks {
            if relative[bin] <= 0.0 {
                continue; // masked by an earlier burst created this frame
            }
            let snr_db = 10.0 * (r * self.history_size as f64 * 1.72).log10();
            let noise_db = 10.0
                * (self.baseline_sum[bin]
                    / self.history_size as f64
                    / (self.fft_size as f64).powi(2)
                    / 1.72
                    / (self.capture_sample_rate_hz / self.fft_size as f64))
                    .log10();
            let burst = ActiveBurst {
                id: self.next_burst_id,
                start: self.current_index.saturating_sub(self.pre_roll as u64),
                last_active: self.current_index,
                center_bin: bin,
                magnitude: snr_db,
                noise: noise_db,
            };
            self.next_burst_id += 1;
            mask_bins(&mut relative, bin, half_width, self.fft_size);
            newly_created.push(burst);
        }

        // Step 8: squelch.
        let total_active = self.active_bursts.len() + newly_created.len();
        if total_active > self.max_bursts {
            // Discard the bursts just created this frame; retire everything else.
            for burst in self.active_bursts.drain(..) {
                if let Ok(record) = self.emit_burst(&burst) {
                    output.push(record);
                }
            }
            self.squelch_count += 3;
            if self.squelch_count >= 10 {
                self.reset_baseline();
                self.squelch_count = 0;
            }
        } else {
            self.active_bursts.extend(newly_created);
            self.squelch_count = self.squelch_count.saturating_sub(1);
        }

        // Step 9: baseline update, only when quiescent or forced.
        if self.active_bursts.is_empty() || forced_baseline_update {
            self.update_baseline(&magnitude);
        }

        output
    }

    fn emit_burst(&self, burst: &ActiveBurst) -> Result<BurstRecord, DetectorError> {
        let stop = self.current_index;
        let samples = self
            .ring
            .extract(burst.start, stop + self.pre_roll as u64)?;
        Ok(BurstRecord {
            id: burst.id,
            start_index: burst.start,
            stop_index: stop,
            center_bin: burst.center_bin,
            capture_center_freq_hz: self.capture_center_freq_hz,
            capture_sample_rate_hz: self.capture_sample_rate_hz,
            fft_size: self.fft_size,
            wall_clock_base_ns: 0,
            magnitude_db: burst.magnitude,
            noise_db: burst.noise,
            samples,
        })
    }

    fn update_baseline(&mut self, magnitude: &[f32]) {
        let row = &mut self.baseline_history[self.history_index];
        for bin in 0..self.fft_size {
            self.baseline_sum[bin] -= row[bin] as f64;
            row[bin] = magnitude[bin];
            self.baseline_sum[bin] += magnitude[bin] as f64;
        }
        self.history_index = (self.history_index + 1) % self.history_size.max(1);
        if self.history_index == 0 {
            self.primed = true;
        }
    }

    fn reset_baseline(&mut self) {
        for row in &mut self.baseline_history {
            row.iter_mut().for_each(|v| *v = 0.0);
        }
        self.baseline_sum.iter_mut().for_each(|v| *v = 0.0);
        self.history_index = 0;
        self.primed = false;
    }

    pub fn is_primed(&self) -> bool {
        self.primed
    }

    pub fn squelch_count(&self) -> u32 {
        self.squelch_count
    }

    pub fn active_burst_count(&self) -> usize {
        self.active_bursts.len()
    }
}

fn mask_bins(relative: &mut [f64], center: usize, half_width: usize, fft_size: usize) {
    let lo = center.saturating_sub(half_width);
    let hi = (center + half_width).min(fft_size - 1);
    for bin in lo..=hi {
        relative[bin] = 0.0;
    }
}
