//! Stage B: per-burst downmix and alignment (grounded on
//! `original_source/burst_downmix.c`'s nine-step pipeline).

use num_complex::Complex32;
use std::f32::consts::PI;

use crate::config::ReceiverConfig;
use crate::dsp::{fft_planner, filters, rotator, window};
use crate::errors::DownmixError;
use crate::kernels::kernels;
use crate::types::{BurstRecord, Direction, FrameRecord};

const UW_DL: [u8; 12] = [0, 2, 2, 2, 2, 0, 0, 0, 2, 0, 0, 2];
const UW_UL: [u8; 12] = [2, 2, 0, 0, 0, 2, 0, 0, 2, 0, 2, 2];
const PREAMBLE_DL_LEN: usize = 16;
const PREAMBLE_UL_LEN: usize = 32;
const RRC_NTAPS: usize = 51;
const RC_NTAPS: usize = 51;
const RRC_ALPHA: f32 = 0.4;
const START_THRESHOLD: f32 = 0.28;
const PRE_START_US: f64 = 100.0;
const CFO_FFT_OVERSAMPLE: usize = 16;

const NORMAL_MIN_SYMBOLS: usize = 131;
const NORMAL_MAX_SYMBOLS: usize = 191;
const SIMPLEX_MIN_SYMBOLS: usize = 80;
const SIMPLEX_MAX_SYMBOLS: usize = 444;
const SIMPLEX_FREQ_MIN_HZ: f64 = 1_626_000_000.0;

fn symbol_to_complex(s: u8) -> Complex32 {
    Complex32::from_polar(1.0, PI / 4.0 + (s as f32) * PI / 2.0)
}

fn nearest_pow2_leq(n: usize) -> usize {
    if n < 2 {
        return 1;
    }
    1usize << (63 - (n as u64).leading_zeros())
}

fn next_pow2(n: usize) -> usize {
    let mut p = 1usize;
    while p < n {
        p <<= 1;
    }
    p
}

/// Build a preamble+UW symbol sequence, upsample, RC-shape, time-reverse
/// and conjugate it into a correlation template, then pre-FFT it.
struct SyncTemplate {
    spectrum: Vec<Complex32>,
    template_len: usize,
    preamble_symbols: usize,
}

impl SyncTemplate {
    fn build(direction: Direction, sps: f64, fft_size: usize) -> Self {
        let (preamble_len, preamble_symbol, uw): (usize, u8, &[u8; 12]) = match direction {
            Direction::Downlink => (PREAMBLE_DL_LEN, 0, &UW_DL),
            Direction::Uplink => (PREAMBLE_UL_LEN, 1, &UW_UL),
            Direction::Undefined => (PREAMBLE_DL_LEN, 0, &UW_DL),
        };

        let mut symbols: Vec<u8> = Vec::with_capacity(preamble_len + 12);
        for i in 0..preamble_len {
            symbols.push(if matches!(direction, Direction::Uplink) {
                if i % 2 == 0 { 1 } else { 0 }
            } else {
                preamble_symbol
            });
        }
        symbols.extend_from_slice(uw);

        let n_symbols = symbols.len();
        let total_samples = ((n_symbols as f64) * sps).round() as usize;
        let mut upsampled = vec![Complex32::new(0.0, 0.0); total_samples];
        for (i, &s) in symbols.iter().enumerate() {
            let idx = ((i as f64) * sps).round() as usize;
            if idx < upsampled.len() {
                upsampled[idx] = symbol_to_complex(s);
            }
        }

        let rc = filters::rc_taps(sps as f32 * 1.0, 1.0, RRC_ALPHA, RC_NTAPS);
        let shaped = filters::convolve_complex(&upsampled, &rc);

        let mut template: Vec<Complex32> = shaped.iter().rev().map(|c| c.conj()).collect();
        let template_len = template.len();
        template.resize(fft_size, Complex32::new(0.0, 0.0));

        let plan = fft_planner::plan(fft_size, true);
        plan.process(&mut template);

        Self {
            spectrum: template,
            template_len,
            preamble_symbols: preamble_len,
        }
    }
}

pub struct Downmixer {
    input_rate_hz: f64,
    output_rate_hz: f64,
    sps: f64,
    burst_width_hz: f64,
    anti_alias_taps: Vec<f32>,
    noise_limit_taps: Vec<f32>,
    rrc_taps: Vec<f32>,
    dl_template: SyncTemplate,
    ul_template: SyncTemplate,
    corr_fft_size: usize,
}

impl Downmixer {
    pub fn new(config: &ReceiverConfig) -> Self {
        let input_rate_hz = config.sample_rate_hz;
        let output_rate_hz = config.output_sample_rate_hz;
        let sps = config.samples_per_symbol;
        let decim = (input_rate_hz / output_rate_hz).round() as usize;
        let decim = decim.max(1);

        let anti_alias_taps = filters::lpf_taps(1.0, input_rate_hz as f32, 1_000_000.0, 200_000.0);
        let noise_limit_taps = filters::lpf_taps(
            1.0,
            output_rate_hz as f32,
            (config.burst_width_hz / 2.0) as f32,
            config.burst_width_hz as f32,
        );
        let rrc_taps = filters::rrc_taps(1.0, output_rate_hz as f32, 25_000.0, RRC_ALPHA, RRC_NTAPS);

        // Correlation FFT size: a power of two comfortably larger than a
        // normal-max-length frame plus either template.
        let corr_fft_size = next_pow2(NORMAL_MAX_SYMBOLS * sps.ceil() as usize + PREAMBLE_UL_LEN * sps.ceil() as usize + 64);
        let dl_template = SyncTemplate::build(Direction::Downlink, sps, corr_fft_size);
        let ul_template = SyncTemplate::build(Direction::Uplink, sps, corr_fft_size);

        let _ = decim;
        Self {
            input_rate_hz,
            output_rate_hz,
            sps,
            burst_width_hz: config.burst_width_hz,
            anti_alias_taps,
            noise_limit_taps,
            rrc_taps,
            dl_template,
            ul_template,
            corr_fft_size,
        }
    }

    pub fn process(&self, burst: &BurstRecord) -> Result<FrameRecord, DownmixError> {
        // Step 1: coarse CFO correction.
        let f_rel = (burst.center_bin as f64 - burst.fft_size as f64 / 2.0) / burst.fft_size as f64;
        let rotated = rotator::rotate_by(&burst.samples, (2.0 * std::f64::consts::PI * f_rel) as f32 * -1.0);
        let mut center_freq_hz = burst.capture_center_freq_hz + f_rel * burst.capture_sample_rate_hz;

        // Step 2: anti-alias filter + decimation.
        let anti_aliased = filters::convolve_complex(&rotated, &self.anti_alias_taps);
        let decim = (self.input_rate_hz / self.output_rate_hz).round() as usize;
        let decim = decim.max(1);
        let n_out = anti_aliased.len() / decim;
        if n_out < RRC_NTAPS {
            return Err(DownmixError::TooShortAfterDecimation {
                len: n_out,
                min: RRC_NTAPS,
            });
        }
        let decimated: Vec<Complex32> = (0..n_out).map(|i| anti_aliased[i * decim]).collect();

        // Step 3: noise-limit LPF.
        let filtered = filters::convolve_complex(&decimated, &self.noise_limit_taps);

        // Step 4: burst start detection.
        let start_idx = match find_burst_start(&filtered, self.sps, self.output_rate_hz) {
            Some(idx) => idx,
            None => return Err(DownmixError::NoStartFound),
        };
        if filtered.len() - start_idx < 100 {
            return Err(DownmixError::NoStartFound);
        }
        let trimmed = &filtered[start_idx..];

        // Step 5: fine CFO estimate and correction.
        let fine_cfo_cycles = estimate_fine_cfo(trimmed, self.sps);
        let fine_cfo_hz = fine_cfo_cycles * self.output_rate_hz;
        let corrected = rotator::rotate_by(trimmed, (2.0 * std::f64::consts::PI * fine_cfo_cycles) as f32 * -1.0);
        center_freq_hz += fine_cfo_hz;

        // Step 6: RRC matched filter.
        let matched = filters::convolve_complex(&corrected, &self.rrc_taps);

        // Step 7: sync-word correlation.
        let (direction, uw_start, phase_corr, sub_sample_correction) =
            self.correlate_sync(&matched)?;

        if uw_start >= matched.len() {
            return Err(DownmixError::InsufficientLength {
                len: matched.len(),
                min: uw_start + 1,
            });
        }
        let aligned = &matched[uw_start..];

        // Step 8: phase alignment.
        let phase_factor = (phase_corr / phase_corr.norm().max(1e-12)).conj();
        let rotated_aligned: Vec<Complex32> = aligned.iter().map(|s| s * phase_factor).collect();

        // Step 9: frame extraction.
        let (min_symbols, max_symbols) = if center_freq_hz >= SIMPLEX_FREQ_MIN_HZ {
            (SIMPLEX_MIN_SYMBOLS, SIMPLEX_MAX_SYMBOLS)
        } else {
            (NORMAL_MIN_SYMBOLS, NORMAL_MAX_SYMBOLS)
        };
        let min_samples = (min_symbols as f64 * self.sps).round() as usize;
        let max_samples = (max_symbols as f64 * self.sps).round() as usize;
        if rotated_aligned.len() < min_samples {
            return Err(DownmixError::InsufficientLength {
                len: rotated_aligned.len(),
                min: min_samples,
            });
        }
        let take = rotated_aligned.len().min(max_samples);
        let samples = rotated_aligned[..take].to_vec();

        Ok(FrameRecord {
            id: burst.id,
            timestamp_ns: burst.wall_clock_base_ns,
            center_freq_hz,
            output_sample_rate_hz: self.output_rate_hz,
            samples_per_symbol: self.sps,
            direction,
            snr_db: burst.magnitude_db,
            noise_db: burst.noise_db,
            uw_sub_sample_correction: sub_sample_correction,
            samples,
        })
    }

    fn correlate_sync(
        &self,
        signal: &[Complex32],
    ) -> Result<(Direction, usize, Complex32, f64), DownmixError> {
        let mut padded = signal.to_vec();
        padded.resize(self.corr_fft_size, Complex32::new(0.0, 0.0));
        let fwd = fft_planner::plan(self.corr_fft_size, true);
        fwd.process(&mut padded);

        let corr_dl = multiply_and_inverse(&padded, &self.dl_template.spectrum, self.corr_fft_size);
        let corr_ul = multiply_and_inverse(&padded, &self.ul_template.spectrum, self.corr_fft_size);

        let (dl_idx, dl_mag) = peak_magnitude(&corr_dl);
        let (ul_idx, ul_mag) = peak_magnitude(&corr_ul);

        let (direction, peak_idx, peak_value, template) = if dl_mag >= ul_mag {
            (Direction::Downlink, dl_idx, corr_dl[dl_idx], &self.dl_template)
        } else {
            (Direction::Uplink, ul_idx, corr_ul[ul_idx], &self.ul_template)
        };

        let sub_sample = quadratic_peak_offset(&if matches!(direction, Direction::Downlink) {
            corr_dl.clone()
        } else {
            corr_ul.clone()
        }, peak_idx);

        let uw_start_f = peak_idx as f64 + sub_sample - template.template_len as f64 + 1.0
            + template.preamble_symbols as f64 * self.sps;
        if uw_start_f < 0.0 {
            return Err(DownmixError::NoStartFound);
        }
        Ok((direction, uw_start_f.round() as usize, peak_value, sub_sample))
    }
}

fn multiply_and_inverse(signal_fft: &[Complex32], template_fft: &[Complex32], fft_size: usize) -> Vec<Complex32> {
    let mut product: Vec<Complex32> = signal_fft
        .iter()
        .zip(template_fft.iter())
        .map(|(a, b)| a * b)
        .collect();
    let inv = fft_planner::plan(fft_size, false);
    inv.process(&mut product);
    let scale = 1.0 / fft_size as f32;
    product.iter_mut().for_each(|c| *c *= scale);
    product
}

fn peak_magnitude(corr: &[Complex32]) -> (usize, f32) {
    let mut mags = vec![0.0f32; corr.len()];
    (kernels().mag_squared)(corr, &mut mags);
    let mut best_idx = 0;
    let mut best_val = 0.0f32;
    for (i, &m) in mags.iter().enumerate() {
        if m > best_val {
            best_val = m;
            best_idx = i;
        }
    }
    (best_idx, best_val)
}

fn quadratic_peak_offset(corr: &[Complex32], peak_idx: usize) -> f64 {
    if peak_idx == 0 || peak_idx + 1 >= corr.len() {
        return 0.0;
    }
    let alpha = corr[peak_idx - 1].norm() as f64;
    let beta = corr[peak_idx].norm() as f64;
    let gamma = corr[peak_idx + 1].norm() as f64;
    let denom = alpha - 2.0 * beta + gamma;
    if denom.abs() < 1e-12 {
        0.0
    } else {
        0.5 * (alpha - gamma) / denom
    }
}

fn find_burst_start(signal: &[Complex32], sps: f64, output_rate_hz: f64) -> Option<usize> {
    let mut mag = vec![0.0f32; signal.len()];
    (kernels().mag_squared)(signal, &mut mag);
    let box_len = ((2.0 * sps).round() as usize).max(3);
    let smoothed = filters::convolve_real(&mag, &filters::box_taps(box_len));

    let peak = smoothed.iter().cloned().fold(0.0f32, f32::max);
    if peak <= 0.0 {
        return None;
    }
    let threshold = START_THRESHOLD * peak;
    let first = smoothed.iter().position(|&v| v > threshold)?;

    let half_fir = box_len / 2;
    let pre_start_samples = (PRE_START_US * 1e-6 * output_rate_hz).round() as usize;
    let backoff = half_fir as isize - pre_start_samples as isize;
    let start = first as isize - backoff;
    Some(start.max(0) as usize)
}

fn estimate_fine_cfo(signal: &[Complex32], sps: f64) -> f64 {
    let window_symbols = 26.0 * sps;
    let n = nearest_pow2_leq((window_symbols as usize).min(signal.len()));
    if n < 4 {
        return 0.0;
    }
    let squared: Vec<Complex32> = signal[..n].iter().map(|s| s * s).collect();
    let win = window::blackman(n);
    let mut windowed = vec![Complex32::new(0.0, 0.0); n];
    (kernels().window_multiply)(&squared, &win, &mut windowed);

    let fft_size = n * CFO_FFT_OVERSAMPLE;
    windowed.resize(fft_size, Complex32::new(0.0, 0.0));
    let plan = fft_planner::plan(fft_size, true);
    plan.process(&mut windowed);
    let shifted = fft_planner::fftshift(&windowed);

    let (peak_idx, _) = peak_magnitude(&shifted);
    let delta = quadratic_peak_offset(&shifted, peak_idx);
    let bin = peak_idx as f64 - fft_size as f64 / 2.0 + delta;
    (bin / fft_size as f64) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ReceiverConfig {
        ReceiverConfig {
            sample_rate_hz: 1_000_000.0,
            output_sample_rate_hz: 153_125.0,
            samples_per_symbol: 6.125,
            burst_width_hz: 40_000.0,
            ..ReceiverConfig::default()
        }
    }

    fn synthetic_burst(n: usize) -> BurstRecord {
        let samples: Vec<Complex32> = (0..n)
            .map(|i| Complex32::from_polar(1.0, i as f32 * 0.01))
            .collect();
        BurstRecord {
            id: 1,
            start_index: 0,
            stop_index: n as u64,
            center_bin: 512,
            capture_center_freq_hz: 1_622_000_000.0,
            capture_sample_rate_hz: 1_000_000.0,
            fft_size: 1024,
            wall_clock_base_ns: 0,
            magnitude_db: 20.0,
            noise_db: -10.0,
            samples,
        }
    }

    #[test]
    fn rejects_too_short_burst() {
        let config = test_config();
        let mixer = Downmixer::new(&config);
        let burst = synthetic_burst(20);
        assert!(mixer.process(&burst).is_err());
    }

    #[test]
    fn find_burst_start_locates_energy_onset() {
        let sps = 6.125;
        let mut signal = vec![Complex32::new(0.0, 0.0); 200];
        for s in signal.iter_mut().skip(100) {
            *s = Complex32::new(1.0, 0.0);
        }
        let start = find_burst_start(&signal, sps, 153_125.0).unwrap();
        assert!(start < 120 && start > 40);
    }

    #[test]
    fn fine_cfo_of_dc_signal_is_near_zero() {
        let signal = vec![Complex32::new(1.0, 0.0); 400];
        let cfo = estimate_fine_cfo(&signal, 6.125);
        assert!(cfo.abs() < 0.05);
    }
}
