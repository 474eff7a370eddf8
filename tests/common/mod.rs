//! Shared test fixtures, pulled in with `mod common;` by each integration
//! suite below. The AWGN helper is relocated from the teacher's
//! `channel.rs`, adapted from `Complex64` symbol noise to `Complex32` IQ
//! samples; the BCH systematic-encode helper builds valid codewords so
//! decode-path tests don't need a full TX chain.

#![allow(dead_code)]

use iridium_receiver::decode::bch::BchCode;
use num_complex::Complex32;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;

/// Add complex Gaussian noise to an IQ stream; `noise_std` is the
/// per-component standard deviation.
pub fn add_awgn(samples: &[Complex32], noise_std: f64, rng: &mut StdRng) -> Vec<Complex32> {
    samples
        .iter()
        .map(|s| {
            let ni: f64 = rng.sample::<f64, _>(StandardNormal) * noise_std;
            let nq: f64 = rng.sample::<f64, _>(StandardNormal) * noise_std;
            s + Complex32::new(ni as f32, nq as f32)
        })
        .collect()
}

/// Pack `data` (0/1 bytes) into a `u32`, data-bits first (MSB), matching
/// `bits_to_uint`.
pub fn bits_to_u32(bits: &[u8]) -> u32 {
    bits.iter().fold(0u32, |acc, &b| (acc << 1) | b as u32)
}

pub fn u32_to_bits(value: u32, n: usize) -> Vec<u8> {
    (0..n).rev().map(|i| ((value >> i) & 1) as u8).collect()
}

/// Build a valid BCH(31,k) + overall-parity 32-bit codeword block for
/// `data_bits` of payload, the inverse of `decode::bch::decode_ra_block`:
/// appends `31 - data_bits` check bits computed as the GF(2) remainder of
/// `data << check_bits` by `code`'s generator, then an overall even-parity
/// bit over the 31 codeword bits.
pub fn encode_ra_block(code: &BchCode, data_bits: usize, data: u32) -> Vec<u8> {
    let check_bits = 31 - data_bits;
    let shifted = data << check_bits;
    let check = code.syndrome(shifted);
    let codeword = shifted | check;

    let mut block = u32_to_bits(codeword, 31);
    let ones: usize = block.iter().map(|&b| b as usize).sum();
    block.push((ones % 2) as u8);
    block
}

/// Re-interleave two 32-bit blocks into the 64-bit stream `de_interleave`
/// would split back into (`out1`, `out2`) -- the inverse permutation,
/// built by inverting the reverse-stride-2 index mapping directly.
pub fn interleave(block1: &[u8], block2: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; 64];
    let mut idx = 0usize;
    let mut s = 31i32;
    while s >= 1 {
        out[(2 * s) as usize] = block1[idx];
        out[(2 * s + 1) as usize] = block1[idx + 1];
        idx += 2;
        s -= 2;
    }
    let mut idx = 0usize;
    let mut s = 30i32;
    while s >= 0 {
        out[(2 * s) as usize] = block2[idx];
        out[(2 * s + 1) as usize] = block2[idx + 1];
        idx += 2;
        s -= 2;
    }
    out
}

/// Re-interleave three 32-bit blocks, the inverse of `de_interleave3`.
pub fn interleave3(block1: &[u8], block2: &[u8], block3: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; 96];
    let mut idx = 0usize;
    let mut s = 47i32;
    while s >= 2 {
        out[(2 * s) as usize] = block1[idx];
        out[(2 * s + 1) as usize] = block1[idx + 1];
        idx += 2;
        s -= 3;
    }
    let mut idx = 0usize;
    let mut s = 46i32;
    while s >= 1 {
        out[(2 * s) as usize] = block2[idx];
        out[(2 * s + 1) as usize] = block2[idx + 1];
        idx += 2;
        s -= 3;
    }
    let mut idx = 0usize;
    let mut s = 45i32;
    while s >= 0 {
        out[(2 * s) as usize] = block3[idx];
        out[(2 * s + 1) as usize] = block3[idx + 1];
        idx += 2;
        s -= 3;
    }
    out
}
