//! Mutex-serialized FFT plan construction.
//!
//! `rustfft`'s planner is cheap to hold but its construction path is not
//! meant to be hammered from many threads at once; every stage that needs a
//! plan goes through this process-wide mutex. The returned plan itself
//! executes lock-free and can run concurrently once built, matching the
//! `FftPlanner` usage in `signal_processing/spectrum.rs`.

use std::sync::{Arc, Mutex, OnceLock};

use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

fn planner() -> &'static Mutex<FftPlanner<f32>> {
    static PLANNER: OnceLock<Mutex<FftPlanner<f32>>> = OnceLock::new();
    PLANNER.get_or_init(|| Mutex::new(FftPlanner::new()))
}

pub fn plan(size: usize, forward: bool) -> Arc<dyn Fft<f32>> {
    let mut planner = planner().lock().expect("fft planner mutex poisoned");
    if forward {
        planner.plan_fft_forward(size)
    } else {
        planner.plan_fft_inverse(size)
    }
}

/// DC-shift (fftshift) a forward-FFT output into `[-N/2, N/2)` bin order.
pub fn fftshift(spectrum: &[Complex32]) -> Vec<Complex32> {
    let n = spectrum.len();
    let half = n / 2;
    let mut out = Vec::with_capacity(n);
    out.extend_from_slice(&spectrum[half..]);
    out.extend_from_slice(&spectrum[..half]);
    out
}
