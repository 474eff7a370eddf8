//! Thread-per-stage wiring: bounded `crossbeam` channels between stage A
//! (detector), the stage B worker pool (downmix), stage C (demod), and
//! stage D (decode), each running on its own named thread (grounded on
//! `sgrams-trx-rs`'s `SdrPipeline::start()` read-loop-per-thread pattern,
//! adapted from its `tokio::sync::broadcast` transport to bounded
//! `crossbeam::channel` queues per spec §5's backpressure requirement).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use num_complex::Complex32;

use crate::config::ReceiverConfig;
use crate::decode::{self, ida::IdaReassembler};
use crate::demod::Demodulator;
use crate::detector::BurstDetector;
use crate::diagnostics::Diagnostics;
use crate::downmix::Downmixer;
use crate::errors::ReceiverError;
use crate::logging::{LogConfig, SignalLogger};
use crate::types::{BurstRecord, DecodedFrame, FrameRecord, IdaMessage};

const RECV_POLL: Duration = Duration::from_millis(200);

/// One classified outcome reaching the caller: either a directly classified
/// frame, or a fully reassembled multi-burst IDA message.
#[derive(Debug, Clone)]
pub enum PipelineOutput {
    Decoded(DecodedFrame),
    Ida(IdaMessage),
}

/// A running receive pipeline: push raw IQ in, pull classified output out.
pub struct Pipeline {
    iq_tx: Sender<Vec<Complex32>>,
    output_rx: Receiver<PipelineOutput>,
    diagnostics: Arc<Diagnostics>,
    running: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Validate `config`, spin up every stage thread, and return a handle
    /// ready to accept samples.
    pub fn start(config: ReceiverConfig) -> Result<Self, ReceiverError> {
        config.validate()?;

        let running = Arc::new(AtomicBool::new(true));
        let diagnostics = Arc::new(Diagnostics::new());

        let (iq_tx, iq_rx) = channel::bounded::<Vec<Complex32>>(config.queue_capacity);
        let (burst_tx, burst_rx) = channel::bounded::<BurstRecord>(config.queue_capacity);
        let (frame_tx, frame_rx) = channel::bounded::<FrameRecord>(config.queue_capacity);
        let (demod_tx, demod_rx) =
            channel::bounded::<crate::types::DemodFrame>(config.queue_capacity);
        let (output_tx, output_rx) = channel::bounded::<PipelineOutput>(config.queue_capacity);

        let mut handles = Vec::new();

        handles.push(spawn_detector(
            config.clone(),
            iq_rx,
            burst_tx,
            Arc::clone(&diagnostics),
            Arc::clone(&running),
        ));

        for worker in 0..config.downmix_workers.max(1) {
            handles.push(spawn_downmix_worker(
                worker,
                config.clone(),
                burst_rx.clone(),
                frame_tx.clone(),
                Arc::clone(&diagnostics),
                Arc::clone(&running),
            ));
        }
        drop(frame_tx);
        drop(burst_rx);

        handles.push(spawn_demod(
            frame_rx,
            demod_tx,
            Arc::clone(&diagnostics),
            Arc::clone(&running),
        ));

        handles.push(spawn_decode(
            demod_rx,
            output_tx,
            Arc::clone(&diagnostics),
            Arc::clone(&running),
        ));

        Ok(Self {
            iq_tx,
            output_rx,
            diagnostics,
            running,
            handles,
        })
    }

    /// Hand a chunk of IQ samples to the detector thread. Drops (and counts
    /// the drop) rather than blocking if the ingest queue is full.
    pub fn push_samples(&self, samples: &[Complex32]) {
        if self.iq_tx.try_send(samples.to_vec()).is_err() {
            self.diagnostics.record_queue_drop();
        }
    }

    /// Block up to `timeout` for the next classified output.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<PipelineOutput> {
        self.output_rx.recv_timeout(timeout).ok()
    }

    /// Non-blocking poll for the next classified output.
    pub fn try_recv(&self) -> Option<PipelineOutput> {
        self.output_rx.try_recv().ok()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Stop accepting new samples, drain every stage in order, and join all
    /// threads. Producer-first: dropping `iq_tx` lets the detector thread
    /// observe a disconnected channel and exit, which in turn drops its own
    /// sender and cascades the same shutdown downstream.
    pub fn shutdown(mut self) {
        self.running.store(false, Ordering::SeqCst);
        drop(self.iq_tx);
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn spawn_detector(
    config: ReceiverConfig,
    iq_rx: Receiver<Vec<Complex32>>,
    burst_tx: Sender<BurstRecord>,
    diagnostics: Arc<Diagnostics>,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name("iridium-detector".to_string())
        .spawn(move || {
            let mut detector = BurstDetector::new(&config);
            let mut logger = SignalLogger::new(LogConfig::default());
            while running.load(Ordering::Relaxed) {
                match iq_rx.recv_timeout(RECV_POLL) {
                    Ok(samples) => {
                        for burst in detector.push_samples(&samples) {
                            diagnostics.record_burst_detected();
                            if burst_tx.try_send(burst).is_err() {
                                diagnostics.record_queue_drop();
                            }
                        }
                        diagnostics.add_detector_underruns(detector.dropped_underrun);
                        detector.dropped_underrun = 0;
                    }
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            logger.info("DETECTOR", "detector thread exiting");
        })
        .expect("failed to spawn iridium-detector thread")
}

fn spawn_downmix_worker(
    worker: usize,
    config: ReceiverConfig,
    burst_rx: Receiver<BurstRecord>,
    frame_tx: Sender<FrameRecord>,
    diagnostics: Arc<Diagnostics>,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name(format!("iridium-downmix-{worker}"))
        .spawn(move || {
            let downmixer = Downmixer::new(&config);
            while running.load(Ordering::Relaxed) {
                match burst_rx.recv_timeout(RECV_POLL) {
                    Ok(burst) => match downmixer.process(&burst) {
                        Ok(frame) => {
                            if frame_tx.try_send(frame).is_err() {
                                diagnostics.record_queue_drop();
                            }
                        }
                        Err(_) => diagnostics.record_downmix_rejection(),
                    },
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })
        .expect("failed to spawn iridium-downmix thread")
}

fn spawn_demod(
    frame_rx: Receiver<FrameRecord>,
    demod_tx: Sender<crate::types::DemodFrame>,
    diagnostics: Arc<Diagnostics>,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name("iridium-demod".to_string())
        .spawn(move || {
            let demodulator = Demodulator::new(true);
            while running.load(Ordering::Relaxed) {
                match frame_rx.recv_timeout(RECV_POLL) {
                    Ok(frame) => match demodulator.process(&frame) {
                        Ok(demod) => {
                            diagnostics.record_demod_frame(demod.confidence_pct, demod.level);
                            if demod_tx.try_send(demod).is_err() {
                                diagnostics.record_queue_drop();
                            }
                        }
                        Err(_) => diagnostics.record_demod_rejection(),
                    },
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })
        .expect("failed to spawn iridium-demod thread")
}

fn spawn_decode(
    demod_rx: Receiver<crate::types::DemodFrame>,
    output_tx: Sender<PipelineOutput>,
    diagnostics: Arc<Diagnostics>,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name("iridium-decode".to_string())
        .spawn(move || {
            let mut reassembler = IdaReassembler::new();
            while running.load(Ordering::Relaxed) {
                match demod_rx.recv_timeout(RECV_POLL) {
                    Ok(demod) => match decode::decode_frame(&demod) {
                        Ok(frame) => {
                            if let DecodedFrame::Ida(ref burst) = frame {
                                if let Some(message) = reassembler.ingest(
                                    burst,
                                    demod.direction,
                                    demod.center_freq_hz,
                                    demod.timestamp_ns,
                                ) {
                                    if output_tx.try_send(PipelineOutput::Ida(message)).is_err() {
                                        diagnostics.record_queue_drop();
                                    }
                                }
                            }
                            if output_tx.try_send(PipelineOutput::Decoded(frame)).is_err() {
                                diagnostics.record_queue_drop();
                            }
                        }
                        Err(_) => diagnostics.record_decode_rejection(),
                    },
                    Err(RecvTimeoutError::Timeout) => {
                        reassembler.flush(now_ns_monotonic());
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })
        .expect("failed to spawn iridium-decode thread")
}

fn now_ns_monotonic() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
