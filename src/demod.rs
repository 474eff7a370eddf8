//! Stage C: QPSK/DQPSK demodulation (grounded on
//! `original_source/qpsk_demod.c`'s Gardner timing recovery, first-order
//! decision-directed PLL, and unique-word verification; the PLL's
//! phase-accumulator shape follows `signal_processing/demodulation.rs`'s
//! `CostasLoop`).

use num_complex::Complex32;
use std::f32::consts::PI;

use crate::errors::DemodError;
use crate::types::{DemodFrame, Direction, FrameRecord};

const PLL_ALPHA: f32 = 0.2;
const CONFIDENCE_ANGLE_RAD: f32 = 22.0 * PI / 180.0;
const MAGNITUDE_DROP: f32 = 8.0;
const MAX_LOW_COUNT: usize = 3;
const UW_MAX_ERRORS: u32 = 2;
const UW_SOFT_THRESHOLD: f64 = 3.0;
const GARDNER_KP: f32 = 0.02;
const GARDNER_KI: f32 = 0.0002;
const DQPSK_MAP: [u8; 4] = [0, 2, 3, 1];

const UW_DL: [u8; 12] = [0, 2, 2, 2, 2, 0, 0, 0, 2, 0, 0, 2];
const UW_UL: [u8; 12] = [2, 2, 0, 0, 0, 2, 0, 0, 2, 0, 2, 2];

pub struct Demodulator {
    pub use_gardner: bool,
}

impl Demodulator {
    pub fn new(use_gardner: bool) -> Self {
        Self { use_gardner }
    }

    pub fn process(&self, frame: &FrameRecord) -> Result<DemodFrame, DemodError> {
        let sps = frame.samples_per_symbol;
        let symbols = if self.use_gardner {
            decimate_gardner(&frame.samples, sps)
        } else {
            decimate_simple(&frame.samples, sps)
        };
        if symbols.len() < 12 {
            return Err(DemodError::InsufficientSymbols {
                have: symbols.len(),
                need: 12,
            });
        }

        let (corrected, total_phase) = qpsk_pll(&symbols);
        let duration = symbols.len() as f64 / (frame.output_sample_rate_hz / sps);

        let (hard, confidence, level) = demod_qpsk(&corrected);
        if hard.len() < 12 {
            return Err(DemodError::InsufficientSymbols {
                have: hard.len(),
                need: 12,
            });
        }

        let dl_distance = check_sync_word(&hard[..12], &UW_DL);
        let ul_distance = check_sync_word(&hard[..12], &UW_UL);

        let direction = if dl_distance <= UW_MAX_ERRORS && dl_distance <= ul_distance {
            Some(Direction::Downlink)
        } else if ul_distance <= UW_MAX_ERRORS {
            Some(Direction::Uplink)
        } else {
            let dl_soft = soft_check_sync_word(&corrected[..12], &UW_DL);
            let ul_soft = soft_check_sync_word(&corrected[..12], &UW_UL);
            if dl_soft < UW_SOFT_THRESHOLD || ul_soft < UW_SOFT_THRESHOLD {
                if dl_soft <= ul_soft {
                    Some(Direction::Downlink)
                } else {
                    Some(Direction::Uplink)
                }
            } else {
                None
            }
        };

        let direction = direction.ok_or(DemodError::UniqueWordMismatch {
            dl_distance,
            ul_distance,
        })?;

        let dqpsk_symbols = decode_dqpsk(&hard);
        let bits = map_symbols_to_bits(&dqpsk_symbols);

        let refined_center_freq_hz = frame.center_freq_hz
            + if duration > 0.0 {
                total_phase as f64 / duration / (2.0 * std::f64::consts::PI)
            } else {
                0.0
            };

        Ok(DemodFrame {
            id: frame.id,
            timestamp_ns: frame.timestamp_ns,
            center_freq_hz: refined_center_freq_hz,
            direction,
            confidence_pct: confidence,
            level: level as f64,
            symbol_count: dqpsk_symbols.len(),
            bits,
            soft: Vec::new(),
        })
    }
}

/// Catmull-Rom cubic interpolation at fractional position `pos` using the
/// four neighboring samples.
fn cubic_interp(signal: &[Complex32], pos: f64) -> Complex32 {
    let i = pos.floor() as isize;
    let frac = (pos - i as f64) as f32;
    let sample = |k: isize| -> Complex32 {
        let idx = k.clamp(0, signal.len() as isize - 1) as usize;
        signal[idx]
    };
    let p0 = sample(i - 1);
    let p1 = sample(i);
    let p2 = sample(i + 1);
    let p3 = sample(i + 2);

    let a = p3 - p2 - p0 + p1;
    let b = p0 - p1 - a;
    let c = p2 - p0;
    let d = p1;

    a * (frac * frac * frac) + b * (frac * frac) + c * frac + d
}

/// Gardner timing-error-detector decimation with a PI loop filter.
fn decimate_gardner(signal: &[Complex32], sps: f64) -> Vec<Complex32> {
    let mut out = Vec::new();
    let mut pos = sps;
    let mut timing_offset = 0.0f32;
    let mut prev = cubic_interp(signal, pos - sps);

    while pos + sps < signal.len() as f64 {
        let current = cubic_interp(signal, pos);
        let mid = cubic_interp(signal, pos - sps * 0.5);

        let error = ((prev - current) * mid.conj()).re;
        let error = error.clamp(-1.0, 1.0);

        timing_offset += GARDNER_KI * error;
        let adjust = (GARDNER_KP * error + timing_offset).clamp(-0.5, 0.5);

        out.push(current);
        prev = current;
        pos += sps + adjust as f64;
    }
    out
}

fn decimate_simple(signal: &[Complex32], sps: f64) -> Vec<Complex32> {
    let mut out = Vec::new();
    let mut pos = 0.0f64;
    while (pos.round() as usize) < signal.len() {
        out.push(signal[pos.round() as usize]);
        pos += sps;
    }
    out
}

/// First-order decision-directed PLL. Returns phase-corrected symbols and
/// the accumulated total phase change (used to refine center frequency).
fn qpsk_pll(symbols: &[Complex32]) -> (Vec<Complex32>, f32) {
    let mut phi_hat = Complex32::new(1.0, 0.0);
    let mut total_phase = 0.0f32;
    let mut out = Vec::with_capacity(symbols.len());

    for &y in symbols {
        let corrected = y * phi_hat;
        let hard = hard_decide(corrected);
        let error = hard.conj() * corrected;
        let angle = error.im.atan2(error.re);
        let correction = Complex32::from_polar(1.0, PLL_ALPHA * angle);
        phi_hat = (correction.conj() * phi_hat) / (correction.conj() * phi_hat).norm().max(1e-12);
        total_phase += PLL_ALPHA * angle;
        out.push(corrected);
    }

    (out, total_phase)
}

fn hard_decide(symbol: Complex32) -> Complex32 {
    let re = if symbol.re >= 0.0 { 1.0 } else { -1.0 };
    let im = if symbol.im >= 0.0 { 1.0 } else { -1.0 };
    Complex32::new(re, im) * std::f32::consts::FRAC_1_SQRT_2
}

/// Hard-decide each symbol to a quadrant 0..=3, detect end-of-frame by
/// three consecutive low-magnitude symbols, and compute angular confidence.
fn demod_qpsk(symbols: &[Complex32]) -> (Vec<u8>, f64, f32) {
    let peak = symbols
        .iter()
        .map(|s| s.norm())
        .fold(0.0f32, f32::max);

    let mut hard = Vec::with_capacity(symbols.len());
    let mut within_tolerance = 0usize;
    let mut magnitude_sum = 0.0f32;
    let mut low_count = 0usize;

    for &s in symbols {
        let mag = s.norm();
        if mag < peak / MAGNITUDE_DROP {
            low_count += 1;
            if low_count >= MAX_LOW_COUNT {
                for _ in 0..(MAX_LOW_COUNT - 1) {
                    hard.pop();
                }
                break;
            }
            continue;
        }
        low_count = 0;

        let sym = match (s.re >= 0.0, s.im >= 0.0) {
            (true, true) => 0u8,
            (false, true) => 1u8,
            (false, false) => 2u8,
            (true, false) => 3u8,
        };
        let ideal_phase = PI / 4.0 + sym as f32 * PI / 2.0;
        let actual_phase = s.im.atan2(s.re);
        let mut diff = (actual_phase - ideal_phase).abs();
        if diff > PI {
            diff = 2.0 * PI - diff;
        }
        if diff <= CONFIDENCE_ANGLE_RAD {
            within_tolerance += 1;
        }
        magnitude_sum += mag;
        hard.push(sym);
    }

    let confidence = if hard.is_empty() {
        0.0
    } else {
        100.0 * within_tolerance as f64 / hard.len() as f64
    };
    let level = if hard.is_empty() {
        0.0
    } else {
        magnitude_sum / hard.len() as f32
    };

    (hard, confidence, level)
}

/// Wrap-aware symbol distance: a 3-step difference counts as 1 step.
fn check_sync_word(observed: &[u8], expected: &[u8; 12]) -> u32 {
    let mut total = 0u32;
    for (o, e) in observed.iter().zip(expected.iter()) {
        let mut diff = (*o as i32 - *e as i32).rem_euclid(4) as u32;
        if diff == 3 {
            diff = 1;
        }
        total += diff;
    }
    total
}

/// Soft-decision rescue: sum of normalized angular distances from the
/// expected constellation phase, one full quadrant == 1.0.
fn soft_check_sync_word(observed: &[Complex32], expected: &[u8; 12]) -> f64 {
    let mut total = 0.0f64;
    for (s, &e) in observed.iter().zip(expected.iter()) {
        let expected_phase = PI / 4.0 + e as f32 * PI / 2.0;
        let actual_phase = s.im.atan2(s.re);
        let mut diff = (actual_phase - expected_phase).abs();
        if diff > PI {
            diff = 2.0 * PI - diff;
        }
        total += (diff as f64) * 2.0 / std::f64::consts::PI;
    }
    total
}

fn decode_dqpsk(hard: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(hard.len());
    let mut prev = 0i32;
    for &s in hard {
        let diff = ((s as i32 - prev).rem_euclid(4)) as usize;
        out.push(DQPSK_MAP[diff]);
        prev = s as i32;
    }
    out
}

fn map_symbols_to_bits(symbols: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(symbols.len() * 2);
    for &s in symbols {
        bits.push((s >> 1) & 1);
        bits.push(s & 1);
    }
    bits
}
