//! Circular store of IQ samples backing stage A's burst extraction.
//!
//! Sized to hold the longest burst plus pre-roll, post-roll, and FFT
//! headroom (spec §3); the detector writes continuously and bursts are
//! extracted by absolute sample index once their end is known.

use num_complex::Complex32;

use crate::errors::DetectorError;

pub struct RingBuffer {
    data: Vec<Complex32>,
    write_pos: usize,
    total_written: u64,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![Complex32::new(0.0, 0.0); capacity.max(1)],
            write_pos: 0,
            total_written: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Absolute index of the oldest sample still resident in the buffer.
    pub fn oldest_index(&self) -> u64 {
        self.total_written.saturating_sub(self.data.len() as u64)
    }

    pub fn write(&mut self, samples: &[Complex32]) {
        for &sample in samples {
            self.data[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % self.data.len();
        }
        self.total_written += samples.len() as u64;
    }

    /// Extract samples `[start, stop)` by absolute index, clamping `start`
    /// up to the oldest still-resident sample.
    pub fn extract(&self, start: u64, stop: u64) -> Result<Vec<Complex32>, DetectorError> {
        let oldest = self.oldest_index();
        let start = start.max(oldest);
        let stop = stop.min(self.total_written);
        if stop <= start {
            return Err(DetectorError::RingBufferUnderrun { start, stop, oldest });
        }
        let len = (stop - start) as usize;
        let cap = self.data.len() as u64;
        let mut pos = (start % cap) as usize;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.data[pos]);
            pos = (pos + 1) % self.data.len();
        }
        Ok(out)
    }
}
