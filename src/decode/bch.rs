//! GF(2) syndrome tables and Chase-style soft decoding (grounded on
//! `original_source/ida_decode.c`'s `build_syn` and
//! `original_source/frame_decode.c`'s `build_syndrome_table`/
//! `chase_bch_decode_p`).

use std::sync::OnceLock;

use crate::utils::gf2_remainder;

const CHASE_FLIP_BITS: usize = 5;

#[derive(Clone, Copy)]
struct SyndromeEntry {
    errors: i8,
    locator: u32,
}

pub struct BchCode {
    poly: u32,
    pub n_bits: usize,
    syn_bits: u32,
    table: Vec<SyndromeEntry>,
}

impl BchCode {
    pub fn new(poly: u32, n_bits: usize, max_errors: usize) -> Self {
        let syn_bits = 31 - poly.leading_zeros() - 1;
        let table_size = 1usize << syn_bits;
        let mut table = vec![SyndromeEntry { errors: -1, locator: 0 }; table_size];

        for k in 0..n_bits {
            let locator = 1u32 << k;
            let syndrome = gf2_remainder(poly, locator) as usize;
            if table[syndrome].errors == -1 {
                table[syndrome] = SyndromeEntry { errors: 1, locator };
            }
        }

        if max_errors >= 2 {
            for i in 0..n_bits {
                for j in (i + 1)..n_bits {
                    let locator = (1u32 << i) | (1u32 << j);
                    let syndrome = gf2_remainder(poly, locator) as usize;
                    if table[syndrome].errors == -1 {
                        table[syndrome] = SyndromeEntry { errors: 2, locator };
                    }
                }
            }
        }

        Self {
            poly,
            n_bits,
            syn_bits,
            table,
        }
    }

    pub fn syndrome(&self, codeword: u32) -> u32 {
        gf2_remainder(self.poly, codeword)
    }

    /// `None` means the syndrome is outside the table's correction capacity.
    pub fn decode(&self, codeword: u32) -> Option<u32> {
        let syndrome = self.syndrome(codeword);
        if syndrome == 0 {
            return Some(codeword);
        }
        let entry = self.table.get(syndrome as usize)?;
        if entry.errors >= 0 {
            Some(codeword ^ entry.locator)
        } else {
            None
        }
    }

    /// Standard BCH decode first; on failure, flip the `CHASE_FLIP_BITS`
    /// least-reliable positions (by smallest `|reliability|`) and try every
    /// non-zero flip combination, MSB-first bit numbering matching
    /// `bits_to_uint`.
    pub fn chase_decode(&self, codeword: u32, reliability: &[f32]) -> Option<u32> {
        if let Some(corrected) = self.decode(codeword) {
            return Some(corrected);
        }
        if reliability.len() < self.n_bits {
            return None;
        }

        let mut positions: Vec<usize> = (0..self.n_bits).collect();
        let flip_count = CHASE_FLIP_BITS.min(self.n_bits);
        // Partial selection: bring the `flip_count` least-reliable positions to the front.
        positions.select_nth_unstable_by(flip_count.saturating_sub(1), |&a, &b| {
            reliability[a].abs().partial_cmp(&reliability[b].abs()).unwrap()
        });
        let selected = &positions[..flip_count];

        for mask in 1u32..(1u32 << flip_count) {
            let mut flipped = codeword;
            for (bit_i, &pos) in selected.iter().enumerate() {
                if mask & (1 << bit_i) != 0 {
                    flipped ^= 1 << (self.n_bits - 1 - pos);
                }
            }
            if let Some(corrected) = self.decode(flipped) {
                return Some(corrected);
            }
        }
        None
    }

    pub fn table_len(&self) -> usize {
        1usize << self.syn_bits
    }
}

/// Decode one 32-bit de-interleaved block against a BCH(31,k) code whose
/// codeword occupies the first 31 bits, with bit 31 an overall parity bit
/// over `data + check` (grounded on `frame_decode.c`'s `chase_bch_decode_p`
/// + `check_parity32`, used identically by the IBC and IRA header/data
/// paths). Returns the corrected `k`-bit data field, or `None` if BCH
/// correction or the parity gate fails.
pub fn decode_ra_block(code: &BchCode, data_bits: usize, block32: &[u8], llr32: &[f32]) -> Option<Vec<u8>> {
    if block32.len() < 32 {
        return None;
    }
    let codeword = crate::utils::bits_to_uint(&block32[..31]);
    let corrected = if llr32.len() >= 31 {
        code.chase_decode(codeword, &llr32[..31])
    } else {
        code.decode(codeword)
    }?;

    let check_bits = 31 - data_bits;
    let data = corrected >> check_bits;
    let check = corrected & ((1u32 << check_bits) - 1);

    let data_ones = (0..data_bits).filter(|&i| (data >> i) & 1 != 0).count();
    let check_ones = (0..check_bits).filter(|&i| (check >> i) & 1 != 0).count();
    let parity_ones = data_ones + check_ones + block32[31] as usize;
    if parity_ones % 2 != 0 {
        return None;
    }

    Some(crate::utils::uint_to_bits(data, data_bits))
}

/// The full set of BCH codes used across frame decode, IDA, and the LCW.
pub struct BchTables {
    pub ra: BchCode,
    pub hdr: BchCode,
    pub da: BchCode,
    pub lcw1: BchCode,
    pub lcw2: BchCode,
    pub lcw3: BchCode,
}

impl BchTables {
    pub fn new() -> Self {
        Self {
            ra: BchCode::new(1207, 31, 2),
            hdr: BchCode::new(29, 7, 1),
            da: BchCode::new(3545, 31, 2),
            lcw1: BchCode::new(29, 7, 1),
            lcw2: BchCode::new(465, 14, 1),
            lcw3: BchCode::new(41, 26, 2),
        }
    }
}

impl Default for BchTables {
    fn default() -> Self {
        Self::new()
    }
}

static TABLES: OnceLock<BchTables> = OnceLock::new();

/// Process-wide syndrome tables, built once on first use.
pub fn tables() -> &'static BchTables {
    TABLES.get_or_init(BchTables::new)
}
