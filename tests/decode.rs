//! Integration coverage for stage D: access-code classification through to
//! field extraction, exercised end-to-end via synthetic BCH-encoded bit
//! streams built with `common::encode_ra_block`/`common::interleave`.

mod common;

use iridium_receiver::decode::bch::BchCode;
use iridium_receiver::decode::decode_frame;
use iridium_receiver::types::{DecodedFrame, DemodFrame, Direction};

const ACCESS_DL: u32 = 0b0011_0000_0011_0000_1111_0011;

fn access_bits() -> Vec<u8> {
    (0..24).rev().map(|i| ((ACCESS_DL >> i) & 1) as u8).collect()
}

fn demod_frame(bits: Vec<u8>) -> DemodFrame {
    DemodFrame {
        id: 1,
        timestamp_ns: 0,
        center_freq_hz: 1_626_270_833.0,
        direction: Direction::Downlink,
        confidence_pct: 100.0,
        level: 1.0,
        symbol_count: bits.len() / 2,
        bits,
        soft: Vec::new(),
    }
}

#[test]
fn rejects_frame_with_no_valid_access_code() {
    let frame = demod_frame(vec![0u8; 48]);
    assert!(decode_frame(&frame).is_err());
}

#[test]
fn classifies_a_synthetic_ibc_frame_and_extracts_its_fields() {
    let ra = BchCode::new(1207, 31, 2);

    // 42-bit RA payload: sat_id=5 (7b), beam_id=12 (6b), pad, timeslot=1, sv_blocking=0, rest 0.
    let mut payload = vec![0u8; 42];
    for (i, b) in common::u32_to_bits(5, 7).into_iter().enumerate() {
        payload[i] = b;
    }
    for (i, b) in common::u32_to_bits(12, 6).into_iter().enumerate() {
        payload[7 + i] = b;
    }
    payload[14] = 1; // timeslot
    payload[15] = 0; // sv_blocking

    let d1 = common::bits_to_u32(&payload[0..21]);
    let d2 = common::bits_to_u32(&payload[21..42]);
    let block1 = common::encode_ra_block(&ra, 21, d1);
    let block2 = common::encode_ra_block(&ra, 21, d2);
    let interleaved = common::interleave(&block1, &block2);

    let mut bits = access_bits();
    bits.extend(std::iter::repeat(0u8).take(6)); // all-zero header -> bc_type 0
    bits.extend(interleaved);

    let frame = demod_frame(bits);
    match decode_frame(&frame).expect("frame should classify as IBC") {
        DecodedFrame::Ibc(ibc) => {
            assert_eq!(ibc.sat_id, 5);
            assert_eq!(ibc.beam_id, 12);
            assert_eq!(ibc.timeslot, 1);
            assert!(!ibc.sv_blocking);
            assert_eq!(ibc.frame_type, Some(0));
            assert_eq!(ibc.iridium_time, None);
        }
        other => panic!("expected Ibc, got {other:?}"),
    }
}

#[test]
fn parse_ira_extracts_position_from_a_synthetic_header_and_payload() {
    // Exercises `decode::ira::parse_ira` directly rather than through the
    // outer access-code dispatch: a 96-bit three-way-interleaved header
    // followed by 42-bit RA payload is, by construction, also a valid
    // (all-zero) 64-bit IBC block prefix, so routing it through
    // `decode_frame` would non-deterministically classify as IBC first.
    use iridium_receiver::decode::ira::parse_ira;

    let ra = BchCode::new(1207, 31, 2);

    // 42-bit RA payload: sat_id=9, beam_id=3, x=0, y=0, z=2047 (near north pole).
    let mut payload = vec![0u8; 42];
    for (i, b) in common::u32_to_bits(9, 7).into_iter().enumerate() {
        payload[i] = b;
    }
    for (i, b) in common::u32_to_bits(3, 6).into_iter().enumerate() {
        payload[7 + i] = b;
    }

    let hdr_d1 = common::encode_ra_block(&ra, 21, 0);
    let hdr_d2 = common::encode_ra_block(&ra, 21, 0);
    let hdr_d3 = common::encode_ra_block(&ra, 21, 0);
    let mut bits = common::interleave3(&hdr_d1, &hdr_d2, &hdr_d3);

    let d1 = common::bits_to_u32(&payload[0..21]);
    let d2 = common::bits_to_u32(&payload[21..42]);
    let block1 = common::encode_ra_block(&ra, 21, d1);
    let block2 = common::encode_ra_block(&ra, 21, d2);
    bits.extend(common::interleave(&block1, &block2));

    let ira = parse_ira(&bits, &[]).expect("should decode as IRA");
    assert_eq!(ira.sat_id, 9);
    assert_eq!(ira.beam_id, 3);
    assert!((ira.lon_deg).abs() < 1e-9);
}
