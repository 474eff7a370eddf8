//! IDA (Iridium Data) frame decode and multi-burst reassembly (grounded on
//! `original_source/ida_decode.c`/`.h`).

use crate::errors::DecodeError;
use crate::types::{Direction, IdaBurst, IdaMessage};
use crate::utils::{bits_to_uint, crc16_ccitt_false};

use super::bch::BchTables;
use super::deinterleave::de_interleave_n;

const BCH_DA_DATA: usize = 20;
const LCW_LEN: usize = 46;
const PAYLOAD_BLOCK: usize = 124;
const MAX_BCH_STREAM: usize = 512;

/// 1-indexed permutation applied to the pair-swapped LCW bits.
const LCW_PERM: [usize; 46] = [
    40, 39, 36, 35, 32, 31, 28, 27, 24, 23, 20, 19, 16, 15, 12, 11, 8, 7, 4, 3, 41, 38, 37, 34, 33,
    30, 29, 26, 25, 22, 21, 18, 17, 14, 13, 10, 9, 6, 5, 2, 1, 46, 45, 44, 43, 42,
];

struct Lcw {
    frame_type: u32,
}

/// Pair-swap, apply [`LCW_PERM`], then BCH-decode the three sub-codewords
/// (poly 29/465/41). `data` must hold at least the 46 LCW bits.
fn decode_lcw(data: &[u8], tables: &BchTables) -> Option<Lcw> {
    if data.len() < LCW_LEN {
        return None;
    }

    let mut swapped = vec![0u8; LCW_LEN];
    let mut i = 0;
    while i < LCW_LEN {
        swapped[i] = data[i + 1];
        swapped[i + 1] = data[i];
        i += 2;
    }

    let lcw_bits: Vec<u8> = LCW_PERM.iter().map(|&p| swapped[p - 1]).collect();

    let v1 = tables.lcw1.decode(bits_to_uint(&lcw_bits[0..7]))?;
    let frame_type = (v1 >> 4) & 0x7;

    let v2_raw = bits_to_uint(&lcw_bits[7..20]) << 1;
    tables.lcw2.decode(v2_raw)?;

    let v3 = bits_to_uint(&lcw_bits[20..46]);
    tables.lcw3.decode(v3)?;

    Some(Lcw { frame_type })
}

/// Descramble 124-bit payload blocks (plus any trailing partial block) into
/// a flat stream of BCH(31,20)-corrected data bits.
fn descramble_payload(data: &[u8], tables: &BchTables) -> Vec<u8> {
    let mut bch_stream = Vec::with_capacity(MAX_BCH_STREAM);
    let n_full = data.len() / PAYLOAD_BLOCK;
    let remain = data.len() % PAYLOAD_BLOCK;

    'blocks: for blk in 0..n_full {
        let block = &data[blk * PAYLOAD_BLOCK..(blk + 1) * PAYLOAD_BLOCK];
        let (half1, half2) = de_interleave_n(block, 62);

        let mut combined = Vec::with_capacity(124);
        combined.extend_from_slice(&half1);
        combined.extend_from_slice(&half2);

        let chunks = [
            &combined[0..31],
            &combined[31..62],
            &combined[62..93],
            &combined[93..124],
        ];
        let order = [3usize, 1, 2, 0];

        for &idx in &order {
            if bch_stream.len() + BCH_DA_DATA > MAX_BCH_STREAM {
                break 'blocks;
            }
            let val = bits_to_uint(chunks[idx]);
            let corrected = match tables.da.decode(val) {
                Some(v) => v,
                None => break 'blocks,
            };
            bch_stream.extend(crate::utils::uint_to_bits(corrected >> 11, BCH_DA_DATA));
        }
    }

    if remain >= 4 && bch_stream.len() + 2 * (remain / 2 - 1) <= MAX_BCH_STREAM {
        let n_sym_last = remain / 2;
        let (h1, h2) = de_interleave_n(&data[n_full * PAYLOAD_BLOCK..], n_sym_last);
        let half_len = n_sym_last;

        if half_len > 1 && bch_stream.len() + BCH_DA_DATA <= MAX_BCH_STREAM {
            let mut combined = Vec::with_capacity(2 * (half_len - 1));
            combined.extend_from_slice(&h2[1..half_len]);
            combined.extend_from_slice(&h1[1..half_len]);

            let mut pos = 0;
            while pos + 31 <= combined.len() && bch_stream.len() + BCH_DA_DATA <= MAX_BCH_STREAM {
                let val = bits_to_uint(&combined[pos..pos + 31]);
                let corrected = match tables.da.decode(val) {
                    Some(v) => v,
                    None => break,
                };
                bch_stream.extend(crate::utils::uint_to_bits(corrected >> 11, BCH_DA_DATA));
                pos += 31;
            }
        }
    }

    bch_stream
}

fn crc_input(bch_stream: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(20 + 12 + bch_stream.len());
    bits.extend_from_slice(&bch_stream[..20]);
    bits.extend(std::iter::repeat(0u8).take(12));
    bits.extend_from_slice(&bch_stream[20..bch_stream.len() - 4]);
    crate::utils::pack_bits(&bits)
}

/// Detect and decode an IDA burst from the bits following the access code.
///
/// `data` must not include the access code; the LCW occupies the first 46
/// bits (frame type must equal 2), followed by 124-bit payload blocks.
pub fn parse_ida(data: &[u8], _llr: &[f32]) -> Result<IdaBurst, DecodeError> {
    if data.len() < LCW_LEN + PAYLOAD_BLOCK {
        return Err(DecodeError::UnclassifiedFrame);
    }

    let tables = bch_tables();
    let lcw = decode_lcw(data, tables).ok_or(DecodeError::UnclassifiedFrame)?;
    if lcw.frame_type != 2 {
        return Err(DecodeError::UnclassifiedFrame);
    }

    let payload_data = &data[LCW_LEN..];
    let bch_stream = descramble_payload(payload_data, tables);

    if bch_stream.len() < 196 {
        return Err(DecodeError::UncorrectableBch { block: 0 });
    }

    let continuation = bch_stream[3] != 0;
    let counter = (bits_to_uint(&bch_stream[5..8])) as u8;
    let len_field = bits_to_uint(&bch_stream[11..16]);
    let zero_check = bits_to_uint(&bch_stream[17..20]);

    if zero_check != 0 {
        return Err(DecodeError::ParityMismatch { block: 0 });
    }
    if len_field > 20 {
        return Err(DecodeError::ParityMismatch { block: 1 });
    }

    let mut payload = vec![0u8; 20];
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte = crate::utils::pack_bits(&bch_stream[20 + i * 8..20 + i * 8 + 8])[0];
    }

    let crc_ok = if len_field > 0 {
        let packed = crc_input(&bch_stream);
        crc16_ccitt_false(&packed) == 0
    } else {
        false
    };

    let payload_len = if len_field > 0 { len_field as usize } else { 20 };
    payload.truncate(payload_len);

    Ok(IdaBurst {
        counter,
        continuation,
        payload,
        crc_ok,
    })
}

use std::sync::OnceLock;

static IDA_TABLES: OnceLock<BchTables> = OnceLock::new();

fn bch_tables() -> &'static BchTables {
    IDA_TABLES.get_or_init(BchTables::new)
}

const REASSEMBLY_SLOTS: usize = 16;
const FREQUENCY_TOLERANCE_HZ: f64 = 260.0;
const MAX_GAP_NS: u64 = 280_000_000;
const FLUSH_TIMEOUT_NS: u64 = 1_000_000_000;

struct ReassemblySlot {
    direction: Direction,
    frequency: f64,
    last_timestamp: u64,
    last_ctr: u8,
    data: Vec<u8>,
}

/// Multi-burst IDA message reassembly, matching bursts into a slot pool by
/// direction/frequency/sequence-counter/timestamp-gap (grounded on
/// `ida_reassemble`/`ida_reassemble_flush`).
pub struct IdaReassembler {
    slots: Vec<Option<ReassemblySlot>>,
}

impl IdaReassembler {
    pub fn new() -> Self {
        Self {
            slots: (0..REASSEMBLY_SLOTS).map(|_| None).collect(),
        }
    }

    /// Feed one CRC-verified burst. Returns `Some(message)` once a
    /// continuation chain closes (or immediately for a single-burst
    /// message); `None` if the burst starts or extends an in-progress
    /// message, or is an unmatched orphan fragment.
    pub fn ingest(
        &mut self,
        burst: &IdaBurst,
        direction: Direction,
        frequency: f64,
        timestamp_ns: u64,
    ) -> Option<IdaMessage> {
        if !burst.crc_ok || burst.payload.is_empty() {
            return None;
        }

        for slot in self.slots.iter_mut().flatten() {
            if slot.direction != direction {
                continue;
            }
            if (slot.frequency - frequency).abs() > FREQUENCY_TOLERANCE_HZ {
                continue;
            }
            if timestamp_ns < slot.last_timestamp {
                continue;
            }
            if timestamp_ns - slot.last_timestamp > MAX_GAP_NS {
                continue;
            }
            if (slot.last_ctr + 1) % 8 != burst.counter {
                continue;
            }

            slot.data.extend_from_slice(&burst.payload);
            slot.last_timestamp = timestamp_ns;
            slot.last_ctr = burst.counter;

            if !burst.continuation {
                let message = IdaMessage {
                    direction: slot.direction,
                    center_freq_hz: slot.frequency,
                    timestamp_ns: slot.last_timestamp,
                    data: std::mem::take(&mut slot.data),
                };
                return self.close_matching_slot(direction, frequency, timestamp_ns, message);
            }
            return None;
        }

        if burst.counter == 0 && !burst.continuation {
            return Some(IdaMessage {
                direction,
                center_freq_hz: frequency,
                timestamp_ns,
                data: burst.payload.clone(),
            });
        }

        if burst.counter == 0 && burst.continuation {
            self.open_slot(burst, direction, frequency, timestamp_ns);
        }

        None
    }

    fn close_matching_slot(
        &mut self,
        direction: Direction,
        frequency: f64,
        timestamp_ns: u64,
        message: IdaMessage,
    ) -> Option<IdaMessage> {
        for slot in &mut self.slots {
            let matches = slot.as_ref().is_some_and(|s| {
                s.direction == direction
                    && (s.frequency - frequency).abs() <= FREQUENCY_TOLERANCE_HZ
                    && s.last_timestamp == timestamp_ns
            });
            if matches {
                *slot = None;
            }
        }
        Some(message)
    }

    fn open_slot(&mut self, burst: &IdaBurst, direction: Direction, frequency: f64, timestamp_ns: u64) {
        let free = self.slots.iter().position(|s| s.is_none());
        let idx = free.unwrap_or_else(|| {
            self.slots
                .iter()
                .enumerate()
                .min_by_key(|(_, s)| s.as_ref().map(|s| s.last_timestamp).unwrap_or(0))
                .map(|(i, _)| i)
                .unwrap_or(0)
        });
        self.slots[idx] = Some(ReassemblySlot {
            direction,
            frequency,
            last_timestamp: timestamp_ns,
            last_ctr: burst.counter,
            data: burst.payload.clone(),
        });
    }

    /// Drop reassembly slots that have not advanced in over a second.
    pub fn flush(&mut self, now_ns: u64) {
        for slot in &mut self.slots {
            if let Some(s) = slot {
                if now_ns > s.last_timestamp + FLUSH_TIMEOUT_NS {
                    *slot = None;
                }
            }
        }
    }
}

impl Default for IdaReassembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_frame_shorter_than_lcw_plus_one_payload_block() {
        let data = vec![0u8; 100];
        assert!(matches!(parse_ida(&data, &[]), Err(DecodeError::UnclassifiedFrame)));
    }

    #[test]
    fn single_burst_message_emits_immediately() {
        let mut reassembler = IdaReassembler::new();
        let burst = IdaBurst {
            counter: 0,
            continuation: false,
            payload: vec![1, 2, 3],
            crc_ok: true,
        };
        let message = reassembler.ingest(&burst, Direction::Downlink, 1_626_000_000.0, 0);
        assert!(message.is_some());
        assert_eq!(message.unwrap().data, vec![1, 2, 3]);
    }

    #[test]
    fn continuation_chain_accumulates_until_final_burst() {
        let mut reassembler = IdaReassembler::new();
        let first = IdaBurst {
            counter: 0,
            continuation: true,
            payload: vec![1, 2],
            crc_ok: true,
        };
        assert!(reassembler
            .ingest(&first, Direction::Downlink, 1_626_000_000.0, 0)
            .is_none());

        let second = IdaBurst {
            counter: 1,
            continuation: false,
            payload: vec![3, 4],
            crc_ok: true,
        };
        let message = reassembler.ingest(&second, Direction::Downlink, 1_626_000_000.0, 1_000_000);
        assert_eq!(message.unwrap().data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn orphan_fragment_with_nonzero_counter_is_discarded() {
        let mut reassembler = IdaReassembler::new();
        let burst = IdaBurst {
            counter: 3,
            continuation: true,
            payload: vec![9],
            crc_ok: true,
        };
        assert!(reassembler
            .ingest(&burst, Direction::Downlink, 1_626_000_000.0, 0)
            .is_none());
    }

    #[test]
    fn flush_drops_stale_slots() {
        let mut reassembler = IdaReassembler::new();
        let first = IdaBurst {
            counter: 0,
            continuation: true,
            payload: vec![1],
            crc_ok: true,
        };
        reassembler.ingest(&first, Direction::Downlink, 1_626_000_000.0, 0);
        reassembler.flush(2_000_000_000);
        assert!(reassembler.slots.iter().all(|s| s.is_none()));
    }
}
