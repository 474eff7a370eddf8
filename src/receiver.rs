//! Top-level receiver facade: wires the pipeline, GSMTAP emission, and the
//! RAW text sink together behind a single entry point (analogous to
//! `processor/mod.rs`'s `ChimeraProcessor` -- one canonical way data flows
//! through the system, everything else a thin wrapper around it).

use std::time::Duration;

use num_complex::Complex32;

use crate::config::ReceiverConfig;
use crate::diagnostics::Diagnostics;
use crate::errors::ReceiverError;
use crate::gsmtap::GsmtapSink;
use crate::pipeline::{Pipeline, PipelineOutput};
use crate::types::DecodedFrame;

/// A fully wired receiver: push IQ samples in, pull classified output out.
/// GSMTAP emission of reassembled IDA messages happens automatically
/// whenever a sink connection was configured.
pub struct Receiver {
    pipeline: Pipeline,
    gsmtap: Option<GsmtapSink>,
}

impl Receiver {
    /// Validate `config`, start every pipeline stage thread, and attempt to
    /// open the GSMTAP UDP destination (a failed GSMTAP connect is
    /// non-fatal -- IDA output is simply not forwarded).
    pub fn new(config: ReceiverConfig) -> Result<Self, ReceiverError> {
        let gsmtap_host = config.gsmtap_host.clone();
        let gsmtap_port = config.gsmtap_port;
        let pipeline = Pipeline::start(config)?;
        let gsmtap = GsmtapSink::connect(&gsmtap_host, gsmtap_port).ok();
        Ok(Self { pipeline, gsmtap })
    }

    /// Hand a chunk of IQ samples to the detector stage.
    pub fn push_samples(&self, samples: &[Complex32]) {
        self.pipeline.push_samples(samples);
    }

    /// Pull the next classified output, forwarding any reassembled IDA
    /// message to GSMTAP before returning it.
    pub fn try_recv(&self) -> Option<PipelineOutput> {
        let output = self.pipeline.try_recv()?;
        self.forward_to_gsmtap(&output);
        Some(output)
    }

    /// Block up to `timeout` for the next classified output.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<PipelineOutput> {
        let output = self.pipeline.recv_timeout(timeout)?;
        self.forward_to_gsmtap(&output);
        Some(output)
    }

    fn forward_to_gsmtap(&self, output: &PipelineOutput) {
        let PipelineOutput::Ida(message) = output else {
            return;
        };
        if let Some(sink) = &self.gsmtap {
            let _ = sink.send(&message.data, message.center_freq_hz, message.direction, 0);
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        self.pipeline.diagnostics()
    }

    /// Drive the receiver until `input` is exhausted, collecting every
    /// `DecodedFrame` produced along the way. Convenience wrapper over
    /// `push_samples`/`try_recv` for batch (offline file) use.
    pub fn run_batch(&self, input: &[Complex32], chunk_size: usize) -> Vec<DecodedFrame> {
        let mut decoded = Vec::new();
        for chunk in input.chunks(chunk_size.max(1)) {
            self.push_samples(chunk);
            while let Some(output) = self.try_recv() {
                if let PipelineOutput::Decoded(frame) = output {
                    decoded.push(frame);
                }
            }
        }
        decoded
    }

    pub fn shutdown(self) {
        self.pipeline.shutdown();
    }
}
