//! Bit-level and GF(2) helpers shared across the decode stage.

use num_complex::Complex64;

pub fn complex_from_interleaved(data: &[f32]) -> Vec<Complex64> {
    data.chunks(2)
        .map(|chunk| Complex64::new(chunk[0] as f64, chunk[1] as f64))
        .collect()
}

pub fn interleaved_from_complex(data: &[Complex64]) -> Vec<f32> {
    data.iter()
        .flat_map(|c| [c.re as f32, c.im as f32])
        .collect()
}

pub fn pack_bits(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &b)| acc | ((b & 1) << (7 - i)))
        })
        .collect()
}

/// MSB-first: `bits[0]` is the most significant bit of the result.
pub fn bits_to_uint(bits: &[u8]) -> u32 {
    bits.iter().fold(0u32, |acc, &b| (acc << 1) | (b & 1) as u32)
}

/// MSB-first inverse of [`bits_to_uint`].
pub fn uint_to_bits(value: u32, width: usize) -> Vec<u8> {
    (0..width)
        .rev()
        .map(|bit| ((value >> bit) & 1) as u8)
        .collect()
}

/// Degree of a polynomial represented as a bitmask (highest set bit).
fn poly_degree(poly: u32) -> u32 {
    31 - poly.leading_zeros()
}

/// GF(2) polynomial remainder of `value` divided by `poly`, matching the
/// binary-CRC convention BCH syndrome computation is built on: MSB-first,
/// `poly`'s own top bit is the implicit leading one.
pub fn gf2_remainder(poly: u32, value: u32) -> u32 {
    if value == 0 {
        return 0;
    }
    let poly_deg = poly_degree(poly);
    let mut remainder = value;
    let mut value_deg = 31 - value.leading_zeros();
    while value_deg >= poly_deg {
        remainder ^= poly << (value_deg - poly_deg);
        if remainder == 0 {
            break;
        }
        value_deg = 31 - remainder.leading_zeros();
    }
    remainder
}

/// CRC-16/CCITT-FALSE: poly 0x1021, init 0xFFFF, no reflection, no xorout.
pub fn crc16_ccitt_false(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_to_uint_roundtrip() {
        for width in 1..=20 {
            for value in [0u32, 1, (1 << width) - 1, (1 << (width - 1))] {
                let bits = uint_to_bits(value, width);
                assert_eq!(bits_to_uint(&bits), value);
            }
        }
    }

    #[test]
    fn complex_interleave_roundtrip() {
        let samples = [Complex64::new(0.5, -0.25), Complex64::new(-1.0, 2.0)];
        let interleaved = interleaved_from_complex(&samples);
        let reconstructed = complex_from_interleaved(&interleaved);
        assert_eq!(reconstructed.len(), samples.len());
        for (a, b) in samples.iter().zip(reconstructed.iter()) {
            assert!((a.re - b.re).abs() < 1e-6);
            assert!((a.im - b.im).abs() < 1e-6);
        }
    }

    #[test]
    fn gf2_remainder_of_multiple_is_zero() {
        // gf2_remainder(poly, poly << k) == 0 for every k >= 0.
        let poly = 1207u32; // BCH(31,21) generator (decimal; bit_length 11)
        for k in 0..20 {
            assert_eq!(gf2_remainder(poly, poly << k), 0, "k={k}");
        }
    }

    #[test]
    fn gf2_remainder_bit_length_matches_bch_31_21() {
        // bit_length(1207) == 11, so syndrome width == 10 == 31 - 21.
        assert_eq!(32 - 1207u32.leading_zeros(), 11);
    }

    #[test]
    fn crc16_ccitt_false_known_vector() {
        // "123456789" -> 0x29B1 is the standard CRC-16/CCITT-FALSE check value.
        assert_eq!(crc16_ccitt_false(b"123456789"), 0x29B1);
    }

    #[test]
    fn pack_bits_msb_first() {
        let bits = [1, 0, 1, 1, 0, 0, 0, 1];
        assert_eq!(pack_bits(&bits), vec![0b1011_0001]);
    }
}
