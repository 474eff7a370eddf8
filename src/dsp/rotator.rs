//! Complex frequency rotator for CFO correction (grounded on `rotator.h`;
//! the phase-accumulator normalization mirrors
//! `signal_processing/demodulation.rs`'s `CostasLoop` state).

use num_complex::Complex32;

#[derive(Clone, Debug)]
pub struct Rotator {
    phase: Complex32,
    phase_incr: Complex32,
}

impl Rotator {
    pub fn new(phase_incr_radians: f32) -> Self {
        Self {
            phase: Complex32::new(1.0, 0.0),
            phase_incr: Complex32::from_polar(1.0, phase_incr_radians),
        }
    }

    pub fn set_phase(&mut self, phase: Complex32) {
        self.phase = phase;
    }

    /// Rotate `input` into `output`, advancing the phase accumulator and
    /// renormalizing its magnitude afterward to prevent long-run drift.
    pub fn rotate(&mut self, input: &[Complex32], output: &mut [Complex32]) {
        for (o, &i) in output.iter_mut().zip(input.iter()) {
            *o = i * self.phase;
            self.phase *= self.phase_incr;
        }
        let mag = self.phase.norm();
        if mag > 0.0 {
            self.phase /= mag;
        }
    }
}

/// One-shot rotation by a constant angular frequency (radians/sample).
pub fn rotate_by(input: &[Complex32], radians_per_sample: f32) -> Vec<Complex32> {
    let mut rotator = Rotator::new(radians_per_sample);
    let mut out = vec![Complex32::new(0.0, 0.0); input.len()];
    rotator.rotate(input, &mut out);
    out
}
