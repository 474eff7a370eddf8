//! IRA (Iridium Ring Alert) detection, field extraction, and geodetic
//! conversion (grounded on `original_source/frame_decode.c`'s IRA branch of
//! `frame_decode` and `parse_ira`).

use crate::errors::DecodeError;
use crate::types::{IraFrame, PagingEntry};

use super::bch::{decode_ra_block, tables};
use super::deinterleave::{de_interleave, de_interleave3, de_interleave3_llr, de_interleave_llr};

const BCH_RA_DATA: usize = 21;
const IRA_MAX_BITS: usize = 512;

fn extract_uint(bits: &[u8]) -> u32 {
    crate::utils::bits_to_uint(bits)
}

/// 12-bit signed magnitude: `bits[0]` is sign, `bits[1..12]` magnitude.
fn extract_signed12(bits: &[u8]) -> i32 {
    let sign = bits[0];
    let mag = extract_uint(&bits[1..12]) as i32;
    if sign != 0 {
        mag - (1 << 11)
    } else {
        mag
    }
}

/// Detect and decode an IRA frame from the bits following the access code.
///
/// Header: 96 bits de-interleaved 3-way into 32-bit blocks, each
/// BCH(31,21)-corrected with an overall parity gate; remaining data
/// follows the same 64-bit/two-block pattern as IBC.
pub fn parse_ira(data: &[u8], llr: &[f32]) -> Result<IraFrame, DecodeError> {
    if data.len() < 96 {
        return Err(DecodeError::UnclassifiedFrame);
    }

    let (ra1, ra2, ra3) = de_interleave3(&data[..96]);
    let (la1, la2, la3) = if llr.len() >= 96 {
        de_interleave3_llr(&llr[..96])
    } else {
        (Vec::new(), Vec::new(), Vec::new())
    };

    let d1 = decode_ra_block(&tables().ra, BCH_RA_DATA, &ra1, &la1)
        .ok_or(DecodeError::UncorrectableBch { block: 0 })?;
    let d2 = decode_ra_block(&tables().ra, BCH_RA_DATA, &ra2, &la2)
        .ok_or(DecodeError::UncorrectableBch { block: 1 })?;
    let d3 = decode_ra_block(&tables().ra, BCH_RA_DATA, &ra3, &la3)
        .ok_or(DecodeError::UncorrectableBch { block: 2 })?;

    let mut bch_stream: Vec<u8> = Vec::with_capacity(IRA_MAX_BITS);
    bch_stream.extend_from_slice(&d1);
    bch_stream.extend_from_slice(&d2);
    bch_stream.extend_from_slice(&d3);

    let mut offset = 96;
    while offset + 64 <= data.len() && bch_stream.len() + 2 * BCH_RA_DATA <= IRA_MAX_BITS {
        let (di1, di2) = de_interleave(&data[offset..offset + 64]);
        let (li1, li2) = if llr.len() >= offset + 64 {
            de_interleave_llr(&llr[offset..offset + 64])
        } else {
            (Vec::new(), Vec::new())
        };
        let rd1 = match decode_ra_block(&tables().ra, BCH_RA_DATA, &di1, &li1) {
            Some(d) => d,
            None => break,
        };
        let rd2 = match decode_ra_block(&tables().ra, BCH_RA_DATA, &di2, &li2) {
            Some(d) => d,
            None => break,
        };
        bch_stream.extend_from_slice(&rd1);
        bch_stream.extend_from_slice(&rd2);
        offset += 64;
    }

    Ok(build_ira(&bch_stream))
}

fn build_ira(bch_data: &[u8]) -> IraFrame {
    let mut frame = IraFrame {
        sat_id: 0,
        beam_id: 0,
        lat_deg: 0.0,
        lon_deg: 0.0,
        alt_km: 0.0,
        paging: Vec::new(),
    };

    if bch_data.len() < 63 {
        return frame;
    }

    frame.sat_id = extract_uint(&bch_data[0..7]) as u8;
    frame.beam_id = extract_uint(&bch_data[7..13]) as u8;

    let pos_x = extract_signed12(&bch_data[13..25]) as f64;
    let pos_y = extract_signed12(&bch_data[25..37]) as f64;
    let pos_z = extract_signed12(&bch_data[37..49]) as f64;

    let xy = (pos_x * pos_x + pos_y * pos_y).sqrt();
    frame.lat_deg = pos_z.atan2(xy).to_degrees();
    frame.lon_deg = pos_y.atan2(pos_x).to_degrees();
    frame.alt_km = ((pos_x * pos_x + pos_y * pos_y + pos_z * pos_z).sqrt() * 4.0).trunc()
        - 6378.0
        + 23.0;

    let mut offset = 63;
    while offset + 42 <= bch_data.len() && frame.paging.len() < 12 {
        let page = &bch_data[offset..offset + 42];
        if page.iter().all(|&b| b == 1) {
            break;
        }
        let tmsi = extract_uint(&page[..32]);
        let msc_id = extract_uint(&page[34..39]) as u8;
        frame.paging.push(PagingEntry { tmsi, msc_id });
        offset += 42;
    }

    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_frame_shorter_than_96_bits() {
        let data = vec![0u8; 50];
        assert!(matches!(parse_ira(&data, &[]), Err(DecodeError::UnclassifiedFrame)));
    }

    #[test]
    fn all_ones_page_terminates_paging_list() {
        let mut bch_data = vec![0u8; 63];
        bch_data.extend(vec![1u8; 42]); // terminator
        bch_data.extend(vec![1u8; 42]); // would-be second page, never reached
        let frame = build_ira(&bch_data);
        assert!(frame.paging.is_empty());
    }

    #[test]
    fn extract_signed12_handles_negative_values() {
        let mut bits = vec![0u8; 12];
        bits[0] = 1; // sign bit
        // magnitude 0 with sign set -> -2048
        assert_eq!(extract_signed12(&bits), -2048);
    }

    #[test]
    fn geodetic_conversion_places_equatorial_point_at_zero_latitude() {
        let mut bch_data = vec![0u8; 63];
        // x positive, y=0, z=0 -> lat=0, lon=0
        let x_bits = crate::utils::uint_to_bits(100, 11);
        bch_data[13] = 0; // sign
        bch_data[14..25].copy_from_slice(&x_bits);
        let frame = build_ira(&bch_data);
        assert!((frame.lat_deg).abs() < 1e-9);
        assert!((frame.lon_deg).abs() < 1e-9);
    }
}
