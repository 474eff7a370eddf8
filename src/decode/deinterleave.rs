//! Bit de-interleaving (grounded on `original_source/frame_decode.c`'s
//! `de_interleave`/`de_interleave3`/`de_interleave_llr`).
//!
//! iridium-toolkit applies a pair-swap to the raw bitstream before
//! de-interleaving, and the reference de-interleaver has its own internal
//! pair-swap; the two cancel. This pipeline never pre-swaps, so neither
//! function swaps either -- same net permutation, one less pass.

/// 64 input bits (32 symbols) -> two 32-bit output blocks.
pub fn de_interleave(input: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let mut out1 = Vec::with_capacity(32);
    let mut s = 31i32;
    while s >= 1 {
        out1.push(input[(2 * s) as usize]);
        out1.push(input[(2 * s + 1) as usize]);
        s -= 2;
    }

    let mut out2 = Vec::with_capacity(32);
    let mut s = 30i32;
    while s >= 0 {
        out2.push(input[(2 * s) as usize]);
        out2.push(input[(2 * s + 1) as usize]);
        s -= 2;
    }

    (out1, out2)
}

/// 96 input bits (48 symbols) -> three 32-bit output blocks.
pub fn de_interleave3(input: &[u8]) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let mut out1 = Vec::with_capacity(32);
    let mut s = 47i32;
    while s >= 2 {
        out1.push(input[(2 * s) as usize]);
        out1.push(input[(2 * s + 1) as usize]);
        s -= 3;
    }

    let mut out2 = Vec::with_capacity(32);
    let mut s = 46i32;
    while s >= 1 {
        out2.push(input[(2 * s) as usize]);
        out2.push(input[(2 * s + 1) as usize]);
        s -= 3;
    }

    let mut out3 = Vec::with_capacity(32);
    let mut s = 45i32;
    while s >= 0 {
        out3.push(input[(2 * s) as usize]);
        out3.push(input[(2 * s + 1) as usize]);
        s -= 3;
    }

    (out1, out2, out3)
}

/// Same permutation as [`de_interleave`], carried over floating-point LLRs.
pub fn de_interleave_llr(input: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let mut out1 = Vec::with_capacity(32);
    let mut s = 31i32;
    while s >= 1 {
        out1.push(input[(2 * s) as usize]);
        out1.push(input[(2 * s + 1) as usize]);
        s -= 2;
    }

    let mut out2 = Vec::with_capacity(32);
    let mut s = 30i32;
    while s >= 0 {
        out2.push(input[(2 * s) as usize]);
        out2.push(input[(2 * s + 1) as usize]);
        s -= 2;
    }

    (out1, out2)
}

/// Same three-way permutation as [`de_interleave3`], carried over LLRs.
pub fn de_interleave3_llr(input: &[f32]) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    let mut out1 = Vec::with_capacity(32);
    let mut s = 47i32;
    while s >= 2 {
        out1.push(input[(2 * s) as usize]);
        out1.push(input[(2 * s + 1) as usize]);
        s -= 3;
    }

    let mut out2 = Vec::with_capacity(32);
    let mut s = 46i32;
    while s >= 1 {
        out2.push(input[(2 * s) as usize]);
        out2.push(input[(2 * s + 1) as usize]);
        s -= 3;
    }

    let mut out3 = Vec::with_capacity(32);
    let mut s = 45i32;
    while s >= 0 {
        out3.push(input[(2 * s) as usize]);
        out3.push(input[(2 * s + 1) as usize]);
        s -= 3;
    }

    (out1, out2, out3)
}

/// Generalized two-way de-interleave: `n_sym` symbols (`2*n_sym` input bits)
/// -> two `n_sym`-bit output blocks, same reverse-stride-2 pattern as
/// [`de_interleave`] at an arbitrary symbol count (used by IDA payload
/// descrambling on 62- and trailing-partial-block symbol counts).
pub fn de_interleave_n(input: &[u8], n_sym: usize) -> (Vec<u8>, Vec<u8>) {
    let mut out1 = Vec::with_capacity(n_sym);
    let mut s = n_sym as i64 - 1;
    while s >= 1 {
        out1.push(input[(2 * s) as usize]);
        out1.push(input[(2 * s + 1) as usize]);
        s -= 2;
    }

    let mut out2 = Vec::with_capacity(n_sym);
    let mut s = n_sym as i64 - 2;
    while s >= 0 {
        out2.push(input[(2 * s) as usize]);
        out2.push(input[(2 * s + 1) as usize]);
        s -= 2;
    }

    (out1, out2)
}
