//! Stage D: de-interleaving, BCH correction, classification, field
//! extraction (grounded on `original_source/frame_decode.c` and
//! `original_source/ida_decode.c`).

pub mod bch;
pub mod deinterleave;
pub mod ibc;
pub mod ida;
pub mod ira;

use crate::errors::DecodeError;
use crate::types::{DecodedFrame, DemodFrame};

const ACCESS_DL: u32 = 0b0011_0000_0011_0000_1111_0011;
const ACCESS_UL: u32 = 0b1100_1100_0011_1100_1111_1100;

/// Top-level frame-decode dispatch: verify access code, then try IBC, IRA,
/// IDA in turn.
pub fn decode_frame(demod: &DemodFrame) -> Result<DecodedFrame, DecodeError> {
    if demod.bits.len() < 24 {
        return Err(DecodeError::AccessCodeMismatch);
    }
    let access = crate::utils::bits_to_uint(&demod.bits[..24]);
    if access != ACCESS_DL && access != ACCESS_UL {
        return Err(DecodeError::AccessCodeMismatch);
    }

    let rest = &demod.bits[24..];
    let soft = if demod.soft.len() >= 24 {
        &demod.soft[24..]
    } else {
        &[]
    };

    if let Ok(ibc) = ibc::parse_ibc(rest, soft) {
        return Ok(DecodedFrame::Ibc(ibc));
    }
    if let Ok(ira) = ira::parse_ira(rest, soft) {
        return Ok(DecodedFrame::Ira(ira));
    }
    if let Ok(burst) = ida::parse_ida(rest, soft) {
        return Ok(DecodedFrame::Ida(burst));
    }
    Err(DecodeError::UnclassifiedFrame)
}
