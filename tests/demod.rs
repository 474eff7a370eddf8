//! Integration coverage for stage C: a sample-and-hold QPSK signal built
//! directly from `UW_DL`'s ideal constellation points, decimated with
//! `decimate_simple` (no Gardner convergence to wait out) so the test is
//! deterministic, grounded on `demod.rs`'s own unit tests and
//! `original_source/qpsk_demod.c`'s unique-word verification.

mod common;

use iridium_receiver::demod::Demodulator;
use iridium_receiver::types::{Direction, FrameRecord};
use num_complex::Complex32;
use std::f32::consts::PI;

const UW_DL: [u8; 12] = [0, 2, 2, 2, 2, 0, 0, 0, 2, 0, 0, 2];
const SPS: usize = 4;

fn ideal_symbol(s: u8) -> Complex32 {
    Complex32::from_polar(1.0, PI / 4.0 + s as f32 * PI / 2.0)
}

/// Sample-and-hold each symbol `SPS` times so `decimate_simple`'s
/// nearest-sample-at-multiples-of-sps picks off the exact ideal point.
fn frame_from_symbols(symbols: &[u8]) -> FrameRecord {
    let mut samples = Vec::with_capacity(symbols.len() * SPS);
    for &s in symbols {
        let point = ideal_symbol(s);
        for _ in 0..SPS {
            samples.push(point);
        }
    }
    FrameRecord {
        id: 1,
        timestamp_ns: 0,
        center_freq_hz: 1_626_000_000.0,
        output_sample_rate_hz: 153_125.0,
        samples_per_symbol: SPS as f64,
        direction: Direction::Undefined,
        snr_db: 20.0,
        noise_db: -5.0,
        uw_sub_sample_correction: 0.0,
        samples,
    }
}

#[test]
fn a_clean_downlink_unique_word_is_recognized_with_full_confidence() {
    let mut symbols = UW_DL.to_vec();
    symbols.extend_from_slice(&[1, 2, 3, 0, 1, 2, 3, 0]);
    let frame = frame_from_symbols(&symbols);

    let demod = Demodulator::new(false);
    let out = demod.process(&frame).expect("clean UW should demodulate");

    assert_eq!(out.direction, Direction::Downlink);
    assert!(out.confidence_pct > 99.0, "confidence was {}", out.confidence_pct);
    assert_eq!(out.symbol_count, symbols.len());
    assert_eq!(out.bits.len(), symbols.len() * 2);
}

#[test]
fn a_frame_with_no_matching_sync_word_is_rejected() {
    // Random-looking symbol sequence matching neither UW_DL nor UW_UL.
    let symbols = [1u8, 3, 0, 2, 1, 3, 0, 2, 1, 3, 0, 2];
    let frame = frame_from_symbols(&symbols);

    let demod = Demodulator::new(false);
    assert!(demod.process(&frame).is_err());
}

#[test]
fn too_few_samples_reports_insufficient_symbols() {
    let frame = frame_from_symbols(&[0, 1]);
    let demod = Demodulator::new(false);
    assert!(demod.process(&frame).is_err());
}
