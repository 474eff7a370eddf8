//! Error taxonomy for the receiver pipeline.
//!
//! Only [`ConfigError`] is fatal (construction-time). Every other stage
//! error is observed through counters and the log, never propagated across
//! a stage boundary as a `Result::Err` — see `DESIGN.md` for the mapping.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),

    #[error("downmix error: {0}")]
    Downmix(#[from] DownmixError),

    #[error("demodulation error: {0}")]
    Demod(#[from] DemodError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

pub type Result<T> = std::result::Result<T, ReceiverError>;

/// Fatal at startup; do not run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid sample rate: {rate} Hz (must be > 0)")]
    InvalidSampleRate { rate: f64 },

    #[error("invalid center frequency: {freq} Hz")]
    InvalidCenterFrequency { freq: f64 },

    #[error("FFT size {size} is not a power of two")]
    InvalidFftSize { size: usize },

    #[error("output sample rate {output} Hz exceeds input sample rate {input} Hz")]
    InvalidDecimation { input: f64, output: f64 },

    #[error("FFT plan construction failed: {reason}")]
    PlanCreationFailed { reason: String },

    #[error("max_bursts must be > 0, got {0}")]
    InvalidMaxBursts(usize),
}

/// Transient input: count, drop, continue.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("ring buffer under-run: requested [{start}, {stop}), oldest available {oldest}")]
    RingBufferUnderrun {
        start: u64,
        stop: u64,
        oldest: u64,
    },

    #[error("queue full, burst dropped")]
    QueueFull,
}

/// Burst rejection: silent fail for that burst, bucketed counter bump.
#[derive(Debug, Error)]
pub enum DownmixError {
    #[error("burst too short after decimation: {len} samples remaining, need {min}")]
    TooShortAfterDecimation { len: usize, min: usize },

    #[error("no burst start found within window")]
    NoStartFound,

    #[error("insufficient remaining length after alignment: {len} < {min}")]
    InsufficientLength { len: usize, min: usize },

    #[error("queue full, frame dropped")]
    QueueFull,
}

#[derive(Debug, Error)]
pub enum DemodError {
    #[error("unique word mismatch: DL distance {dl_distance}, UL distance {ul_distance}")]
    UniqueWordMismatch { dl_distance: u32, ul_distance: u32 },

    #[error("insufficient symbols: {have} < {need}")]
    InsufficientSymbols { have: usize, need: usize },

    #[error("queue full, demod frame dropped")]
    QueueFull,
}

/// FEC failure: terminates the current decode chain, best-effort output of
/// whatever decoded before the failure.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("access code mismatch")]
    AccessCodeMismatch,

    #[error("uncorrectable BCH syndrome in block {block}")]
    UncorrectableBch { block: usize },

    #[error("parity check failed in block {block}")]
    ParityMismatch { block: usize },

    #[error("could not classify frame as IBC, IRA, or IDA")]
    UnclassifiedFrame,
}

/// Logged once, not fatal.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("UDP send failed: {reason}")]
    UdpSend { reason: String },

    #[error("stdout write failed: {reason}")]
    StdoutWrite { reason: String },
}
