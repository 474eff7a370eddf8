//! Records exchanged between pipeline stages (spec §3).
//!
//! Each record is owned exclusively by the stage holding it; there are no
//! cross-stage back-pointers, so ownership simply moves downstream on send.

use num_complex::Complex32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Uplink,
    Downlink,
    Undefined,
}

/// Tracked inside stage A while a burst is still live.
#[derive(Debug, Clone)]
pub struct ActiveBurst {
    pub id: u64,
    pub start: u64,
    pub last_active: u64,
    pub center_bin: usize,
    pub magnitude: f64,
    pub noise: f64,
}

/// A→B: one detected burst's raw IQ content plus capture metadata.
#[derive(Debug, Clone)]
pub struct BurstRecord {
    pub id: u64,
    pub start_index: u64,
    pub stop_index: u64,
    pub center_bin: usize,
    pub capture_center_freq_hz: f64,
    pub capture_sample_rate_hz: f64,
    pub fft_size: usize,
    pub wall_clock_base_ns: u64,
    pub magnitude_db: f64,
    pub noise_db: f64,
    pub samples: Vec<Complex32>,
}

/// B→C: one aligned frame, samples starting at the unique word.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    pub id: u64,
    pub timestamp_ns: u64,
    pub center_freq_hz: f64,
    pub output_sample_rate_hz: f64,
    pub samples_per_symbol: f64,
    pub direction: Direction,
    pub snr_db: f64,
    pub noise_db: f64,
    pub uw_sub_sample_correction: f64,
    pub samples: Vec<Complex32>,
}

/// C→D: demodulated bits plus the quality metrics that travel with them.
#[derive(Debug, Clone)]
pub struct DemodFrame {
    pub id: u64,
    pub timestamp_ns: u64,
    pub center_freq_hz: f64,
    pub direction: Direction,
    pub confidence_pct: f64,
    pub level: f64,
    pub symbol_count: usize,
    pub bits: Vec<u8>,
    /// Per-bit soft reliability, aligned with `bits`; empty when unavailable.
    pub soft: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct PagingEntry {
    pub tmsi: u32,
    pub msc_id: u8,
}

#[derive(Debug, Clone)]
pub struct IraFrame {
    pub sat_id: u8,
    pub beam_id: u8,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_km: f64,
    pub paging: Vec<PagingEntry>,
}

#[derive(Debug, Clone)]
pub struct IbcFrame {
    pub sat_id: u8,
    pub beam_id: u8,
    pub timeslot: u8,
    pub sv_blocking: bool,
    pub frame_type: Option<u8>,
    pub iridium_time: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct IdaBurst {
    pub counter: u8,
    pub continuation: bool,
    pub payload: Vec<u8>,
    pub crc_ok: bool,
}

/// A fully reassembled IDA message, emitted once the continuation chain
/// closes (or immediately, for a single-burst message).
#[derive(Debug, Clone)]
pub struct IdaMessage {
    pub direction: Direction,
    pub center_freq_hz: f64,
    pub timestamp_ns: u64,
    pub data: Vec<u8>,
}

/// D→sinks: the classified outcome of one demod frame.
#[derive(Debug, Clone)]
pub enum DecodedFrame {
    Ira(IraFrame),
    Ibc(IbcFrame),
    Ida(IdaBurst),
}
