//! Window functions for spectral analysis (grounded on `window_func.c`'s
//! `blackman_window`).

use std::f32::consts::PI;

pub fn blackman(n: usize) -> Vec<f32> {
    if n <= 1 {
        return vec![1.0; n];
    }
    let denom = (n - 1) as f32;
    (0..n)
        .map(|i| {
            let x = i as f32;
            0.42 - 0.5 * (2.0 * PI * x / denom).cos() + 0.08 * (4.0 * PI * x / denom).cos()
        })
        .collect()
}

/// Blackman window scaled by `1/0.42` so that the magnitude response
/// reports literal SNR in dB (the burst detector's requirement).
pub fn blackman_scaled(n: usize) -> Vec<f32> {
    blackman(n).into_iter().map(|w| w / 0.42).collect()
}
