//! IBC (Iridium Broadcast Channel) detection and field extraction
//! (grounded on `original_source/frame_decode.c`'s IBC branch of
//! `frame_decode` and `parse_ibc`).

use crate::errors::DecodeError;
use crate::types::IbcFrame;

use super::bch::{decode_ra_block, tables};
use super::deinterleave::{de_interleave, de_interleave_llr};

const BCH_RA_DATA: usize = 21;
const IBC_MAX_BITS: usize = 262;

fn extract_uint(bits: &[u8]) -> u32 {
    crate::utils::bits_to_uint(bits)
}

/// Detect and decode an IBC frame from the bits following the access code.
///
/// Header: 6-bit BCH(7,3); then 64-bit interleaved blocks, each split into
/// two 32-bit halves and BCH(31,21)-corrected with an overall parity gate.
pub fn parse_ibc(data: &[u8], llr: &[f32]) -> Result<IbcFrame, DecodeError> {
    if data.len() < 6 + 64 {
        return Err(DecodeError::UnclassifiedFrame);
    }

    let hdr_val = extract_uint(&data[..6]);
    let hdr_syn = tables().hdr.syndrome(hdr_val);
    let hdr_val = if hdr_syn == 0 {
        hdr_val
    } else {
        match tables().hdr.decode(hdr_val) {
            Some(corrected) => corrected,
            None => return Err(DecodeError::UnclassifiedFrame),
        }
    };
    let bc_type = (hdr_val >> 4) & 0x7;

    let mut bch_stream: Vec<u8> = Vec::with_capacity(IBC_MAX_BITS);

    let (di1, di2) = de_interleave(&data[6..6 + 64]);
    let (li1, li2) = if llr.len() >= 6 + 64 {
        de_interleave_llr(&llr[6..6 + 64])
    } else {
        (Vec::new(), Vec::new())
    };
    let d1 = decode_ra_block(&tables().ra, BCH_RA_DATA, &di1, &li1)
        .ok_or(DecodeError::UncorrectableBch { block: 0 })?;
    let d2 = decode_ra_block(&tables().ra, BCH_RA_DATA, &di2, &li2)
        .ok_or(DecodeError::UncorrectableBch { block: 1 })?;
    bch_stream.extend_from_slice(&d1);
    bch_stream.extend_from_slice(&d2);

    let ibc_max = data.len().min(IBC_MAX_BITS);
    let mut offset = 6 + 64;
    while offset + 64 <= ibc_max && bch_stream.len() + 2 * BCH_RA_DATA <= IBC_MAX_BITS {
        let (di1, di2) = de_interleave(&data[offset..offset + 64]);
        let (li1, li2) = if llr.len() >= offset + 64 {
            de_interleave_llr(&llr[offset..offset + 64])
        } else {
            (Vec::new(), Vec::new())
        };
        let d1 = match decode_ra_block(&tables().ra, BCH_RA_DATA, &di1, &li1) {
            Some(d) => d,
            None => break,
        };
        let d2 = match decode_ra_block(&tables().ra, BCH_RA_DATA, &di2, &li2) {
            Some(d) => d,
            None => break,
        };
        bch_stream.extend_from_slice(&d1);
        bch_stream.extend_from_slice(&d2);
        offset += 64;
    }

    Ok(build_ibc(&bch_stream, bc_type as u8))
}

fn build_ibc(bch_data: &[u8], bc_type: u8) -> IbcFrame {
    let mut frame = IbcFrame {
        sat_id: 0,
        beam_id: 0,
        timeslot: 0,
        sv_blocking: false,
        frame_type: Some(bc_type),
        iridium_time: None,
    };

    if bch_data.len() < 42 {
        return frame;
    }

    frame.sat_id = extract_uint(&bch_data[0..7]) as u8;
    frame.beam_id = extract_uint(&bch_data[7..13]) as u8;
    frame.timeslot = bch_data[14];
    frame.sv_blocking = bch_data[15] != 0;

    if bch_data.len() >= 84 {
        let block_type = extract_uint(&bch_data[42..48]);
        if block_type == 1 {
            frame.iridium_time = Some(extract_uint(&bch_data[52..84]));
        }
    }

    frame
}
