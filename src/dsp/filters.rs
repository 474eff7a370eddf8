//! FIR filter coefficient generators and convolution (grounded on
//! `fir_filter.c`'s `rrc_taps`/`rc_taps`/`lpf_taps`/`box_taps`; convolution
//! shape adapted from `signal_processing/filters.rs`'s `convolve`).

use num_complex::Complex32;
use std::f32::consts::PI;

fn sinc(x: f32) -> f32 {
    if x.abs() < 1e-10 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Root-raised-cosine taps, unit-energy normalized. `ntaps` is rounded up
/// to the next odd length.
pub fn rrc_taps(gain: f32, sample_rate: f32, symbol_rate: f32, alpha: f32, ntaps: usize) -> Vec<f32> {
    let ntaps = ntaps | 1;
    let sps = sample_rate / symbol_rate;
    let center = (ntaps / 2) as f32;
    let mut taps = vec![0.0f32; ntaps];
    let mut energy = 0.0f32;
    for (i, tap) in taps.iter_mut().enumerate() {
        let t = (i as f32 - center) / sps;
        *tap = if t.abs() < 1e-6 {
            1.0 - alpha + 4.0 * alpha / PI
        } else if alpha > 0.0 && (t.abs() - 1.0 / (4.0 * alpha)).abs() < 1e-6 {
            (alpha / std::f32::consts::SQRT_2)
                * ((1.0 + 2.0 / PI) * (PI / (4.0 * alpha)).sin()
                    + (1.0 - 2.0 / PI) * (PI / (4.0 * alpha)).cos())
        } else {
            let num = (PI * t * (1.0 - alpha)).sin() + 4.0 * alpha * t * (PI * t * (1.0 + alpha)).cos();
            let den = PI * t * (1.0 - (4.0 * alpha * t).powi(2));
            num / den
        };
        energy += *tap * *tap;
    }
    let scale = gain / energy.sqrt();
    for tap in &mut taps {
        *tap *= scale;
    }
    taps
}

/// Raised-cosine taps used to pulse-shape the sync-word correlation template.
pub fn rc_taps(sample_rate: f32, symbol_rate: f32, alpha: f32, ntaps: usize) -> Vec<f32> {
    let ntaps = ntaps | 1;
    let sps = sample_rate / symbol_rate;
    let center = (ntaps / 2) as f32;
    (0..ntaps)
        .map(|i| {
            let t = (i as f32 - center) / sps;
            if t.abs() < 1e-6 {
                1.0
            } else if alpha > 0.0 && (t.abs() - 1.0 / (2.0 * alpha)).abs() < 1e-6 {
                (PI / 4.0) * sinc(1.0 / (2.0 * alpha))
            } else {
                sinc(t) * (PI * alpha * t).cos() / (1.0 - (2.0 * alpha * t).powi(2))
            }
        })
        .collect()
}

/// Windowed-sinc low-pass taps (Blackman-Harris window), scaled for unity
/// DC gain and then by `gain`. Tap count is derived from the transition
/// width, always rounded up to an odd length.
pub fn lpf_taps(gain: f32, sample_rate: f32, cutoff_freq: f32, transition_width: f32) -> Vec<f32> {
    let ntaps = ((4.0 * sample_rate / transition_width) as usize) | 1;
    let center = (ntaps / 2) as f32;
    let omega_c = 2.0 * PI * cutoff_freq / sample_rate;
    let denom = (ntaps - 1) as f32;
    let mut taps = vec![0.0f32; ntaps];
    let mut dc_gain = 0.0f32;
    for (i, tap) in taps.iter_mut().enumerate() {
        let n = i as f32 - center;
        let h = if n.abs() < 1e-6 {
            omega_c / PI
        } else {
            (omega_c * n).sin() / (PI * n)
        };
        let w = 0.35875 - 0.48829 * (2.0 * PI * i as f32 / denom).cos()
            + 0.14128 * (4.0 * PI * i as f32 / denom).cos()
            - 0.01168 * (6.0 * PI * i as f32 / denom).cos();
        *tap = h * w;
        dc_gain += *tap;
    }
    if dc_gain.abs() > 0.0 {
        let scale = gain / dc_gain;
        for tap in &mut taps {
            *tap *= scale;
        }
    }
    taps
}

/// Box (moving-average) taps of the given length.
pub fn box_taps(length: usize) -> Vec<f32> {
    vec![1.0 / length.max(1) as f32; length.max(1)]
}

/// Zero-padded same-length complex convolution.
pub fn convolve_complex(signal: &[Complex32], taps: &[f32]) -> Vec<Complex32> {
    let half = taps.len() / 2;
    let mut out = vec![Complex32::new(0.0, 0.0); signal.len()];
    for (i, o) in out.iter_mut().enumerate() {
        let mut acc = Complex32::new(0.0, 0.0);
        for (j, &k) in taps.iter().enumerate() {
            let idx = i as isize + j as isize - half as isize;
            if idx >= 0 && (idx as usize) < signal.len() {
                acc += signal[idx as usize] * k;
            }
        }
        *o = acc;
    }
    out
}

/// Zero-padded same-length real convolution (used for box-filter smoothing
/// of a magnitude-squared trace).
pub fn convolve_real(signal: &[f32], taps: &[f32]) -> Vec<f32> {
    let half = taps.len() / 2;
    let mut out = vec![0.0f32; signal.len()];
    for (i, o) in out.iter_mut().enumerate() {
        let mut acc = 0.0f32;
        for (j, &k) in taps.iter().enumerate() {
            let idx = i as isize + j as isize - half as isize;
            if idx >= 0 && (idx as usize) < signal.len() {
                acc += signal[idx as usize] * k;
            }
        }
        *o = acc;
    }
    out
}

/// Complex FIR with decimation over the valid (non-padded) region: output
/// sample `i` is the dot product of `taps` with
/// `signal[i*decimation .. i*decimation+ntaps]`.
pub fn convolve_complex_decimate(
    signal: &[Complex32],
    taps: &[f32],
    decimation: usize,
    n_out: usize,
) -> Vec<Complex32> {
    let mut out = Vec::with_capacity(n_out);
    for i in 0..n_out {
        let base = i * decimation;
        let mut acc = Complex32::new(0.0, 0.0);
        for (j, &k) in taps.iter().enumerate() {
            acc += signal[base + j] * k;
        }
        out.push(acc);
    }
    out
}
