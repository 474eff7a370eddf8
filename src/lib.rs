//! Signal-processing and frame-decoding pipeline for an Iridium L-band SDR
//! receiver.
//!
//! Raw IQ samples flow through four stages -- burst detection, downmix/
//! timing recovery, QPSK demodulation, and frame decode -- each on its own
//! worker thread, connected by bounded queues (see [`pipeline`]). [`receiver`]
//! is the single entry point tying the pipeline to the external sinks
//! (RAW text lines, GSMTAP/UDP).

pub mod config;
pub mod decode;
pub mod demod;
pub mod detector;
pub mod diagnostics;
pub mod downmix;
pub mod dsp;
pub mod errors;
pub mod gsmtap;
pub mod kernels;
pub mod logging;
pub mod pipeline;
pub mod raw_format;
pub mod receiver;
pub mod ring_buffer;
pub mod types;
pub mod utils;

pub use config::ReceiverConfig;
pub use errors::{ReceiverError, Result};
pub use pipeline::{Pipeline, PipelineOutput};
pub use receiver::Receiver;
pub use types::{DecodedFrame, Direction, IbcFrame, IdaBurst, IdaMessage, IraFrame};
