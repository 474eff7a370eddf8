//! `iridium-toolkit` RAW line formatting (grounded on
//! `original_source/frame_output.c`'s `frame_output_print`).
//!
//! ```text
//! RAW: {file_info} {timestamp_ms:012.4} {freq_hz:010} N:{mag:05.2}{noise:+06.2}
//!      I:{id:011} {conf:3}% {level:.5} {payload_symbols:3} {bits...}
//! ```

use crate::types::DemodFrame;

/// Stateful RAW-line emitter: auto-derives `file_info` and the `t0`
/// reference timestamp from the first frame it sees, exactly like the
/// C implementation's lazy `frame_output_init`.
pub struct RawFormatter {
    file_info: Option<String>,
    t0_ns: Option<u64>,
}

impl RawFormatter {
    /// `file_info` of `None` auto-generates `i-{unix_seconds}-t1` from the
    /// first frame's timestamp, matching the original's fallback.
    pub fn new(file_info: Option<String>) -> Self {
        Self {
            file_info,
            t0_ns: None,
        }
    }

    /// Format one demodulated frame. `magnitude_db`/`noise_db` come from the
    /// burst that produced `frame` (carried separately since this pipeline's
    /// `DemodFrame` doesn't itself retain signal-level fields).
    pub fn format(&mut self, frame: &DemodFrame, magnitude_db: f64, noise_db: f64) -> String {
        let t0 = *self
            .t0_ns
            .get_or_insert((frame.timestamp_ns / 1_000_000_000) * 1_000_000_000);

        if self.file_info.is_none() {
            self.file_info = Some(format!("i-{}-t1", t0 / 1_000_000_000));
        }

        let ts_ms = (frame.timestamp_ns as i64 - t0 as i64) as f64 / 1_000_000.0;
        let freq_hz = (frame.center_freq_hz + 0.5) as i64;
        let payload_syms = frame.symbol_count as i64;
        let bits: String = frame
            .bits
            .iter()
            .map(|&b| (b'0' + (b & 1)) as char)
            .collect();

        format!(
            "RAW: {} {:012.4} {:010} N:{:05.2}{:+06.2} I:{:011} {:3}% {:.5} {:3} {}",
            self.file_info.as_deref().unwrap_or(""),
            ts_ms,
            freq_hz,
            magnitude_db,
            noise_db,
            frame.id,
            frame.confidence_pct.round() as i64,
            frame.level,
            payload_syms,
            bits,
        )
    }
}
