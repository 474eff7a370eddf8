//! SIMD dispatch table for the hottest per-sample kernels (magnitude,
//! window multiply). A scalar implementation is always correct; an
//! AVX2+FMA path is substituted at first use when the host CPU supports it.

use std::sync::OnceLock;

use num_complex::Complex32;

#[derive(Clone, Copy)]
pub struct KernelSet {
    pub mag_squared: fn(&[Complex32], &mut [f32]),
    pub fftshift_mag_squared: fn(&[Complex32], &mut [f32]),
    pub window_multiply: fn(&[Complex32], &[f32], &mut [Complex32]),
    pub relative_magnitude: fn(&[f32], &[f32], &mut [f32]),
    pub baseline_update: fn(&mut [f32], &[f32], &[f32]),
}

pub fn kernels() -> &'static KernelSet {
    static KERNELS: OnceLock<KernelSet> = OnceLock::new();
    KERNELS.get_or_init(select_kernels)
}

fn select_kernels() -> KernelSet {
    #[cfg(target_arch = "x86_64")]
    {
        if std::is_x86_feature_detected!("avx2") && std::is_x86_feature_detected!("fma") {
            return KernelSet {
                mag_squared: avx2::mag_squared,
                fftshift_mag_squared: scalar::fftshift_mag_squared,
                window_multiply: avx2::window_multiply,
                relative_magnitude: scalar::relative_magnitude,
                baseline_update: scalar::baseline_update,
            };
        }
    }
    KernelSet {
        mag_squared: scalar::mag_squared,
        fftshift_mag_squared: scalar::fftshift_mag_squared,
        window_multiply: scalar::window_multiply,
        relative_magnitude: scalar::relative_magnitude,
        baseline_update: scalar::baseline_update,
    }
}

mod scalar {
    use super::*;

    pub fn mag_squared(input: &[Complex32], output: &mut [f32]) {
        for (o, i) in output.iter_mut().zip(input.iter()) {
            *o = i.re * i.re + i.im * i.im;
        }
    }

    /// `fftshift` followed by magnitude-squared, fused into one pass.
    pub fn fftshift_mag_squared(input: &[Complex32], output: &mut [f32]) {
        let n = input.len();
        let half = n / 2;
        for i in 0..n {
            let src = (i + half) % n;
            output[i] = input[src].re * input[src].re + input[src].im * input[src].im;
        }
    }

    pub fn window_multiply(input: &[Complex32], window: &[f32], output: &mut [Complex32]) {
        for ((o, i), w) in output.iter_mut().zip(input.iter()).zip(window.iter()) {
            *o = Complex32::new(i.re * w, i.im * w);
        }
    }

    pub fn relative_magnitude(magnitude: &[f32], baseline: &[f32], output: &mut [f32]) {
        for ((o, &m), &b) in output.iter_mut().zip(magnitude.iter()).zip(baseline.iter()) {
            *o = if b > 0.0 { m / b } else { 0.0 };
        }
    }

    pub fn baseline_update(sum: &mut [f32], evicted: &[f32], new: &[f32]) {
        for ((s, &e), &n) in sum.iter_mut().zip(evicted.iter()).zip(new.iter()) {
            *s += n - e;
        }
    }
}

#[cfg(target_arch = "x86_64")]
mod avx2 {
    use super::*;
    use std::arch::x86_64::*;

    /// Safe entry point: reached only after a runtime feature check in
    /// `select_kernels`.
    pub fn mag_squared(input: &[Complex32], output: &mut [f32]) {
        unsafe { mag_squared_avx2(input, output) }
    }

    #[target_feature(enable = "avx2,fma")]
    unsafe fn mag_squared_avx2(input: &[Complex32], output: &mut [f32]) {
        let n = input.len();
        let mut i = 0;
        // Each 256-bit register packs four complex samples (re,im interleaved).
        while i + 4 <= n {
            let ptr = input.as_ptr().add(i) as *const f32;
            let v = _mm256_loadu_ps(ptr);
            let sq = _mm256_mul_ps(v, v);
            // hadd sums adjacent pairs within each 128-bit lane: positions
            // 0,1 and 4,5 of the result hold the four re^2+im^2 sums.
            let summed = _mm256_hadd_ps(sq, sq);
            let mut tmp = [0.0f32; 8];
            _mm256_storeu_ps(tmp.as_mut_ptr(), summed);
            output[i] = tmp[0];
            output[i + 1] = tmp[1];
            output[i + 2] = tmp[4];
            output[i + 3] = tmp[5];
            i += 4;
        }
        while i < n {
            let c = input[i];
            output[i] = c.re.mul_add(c.re, c.im * c.im);
            i += 1;
        }
    }

    pub fn window_multiply(input: &[Complex32], window: &[f32], output: &mut [Complex32]) {
        unsafe { window_multiply_avx2(input, window, output) }
    }

    #[target_feature(enable = "avx2,fma")]
    unsafe fn window_multiply_avx2(input: &[Complex32], window: &[f32], output: &mut [Complex32]) {
        let n = input.len();
        let mut i = 0;
        while i + 4 <= n {
            let in_ptr = input.as_ptr().add(i) as *const f32;
            let v = _mm256_loadu_ps(in_ptr);
            let w128 = _mm_loadu_ps(window.as_ptr().add(i));
            let w_lo = _mm_unpacklo_ps(w128, w128); // [w0,w0,w1,w1]
            let w_hi = _mm_unpackhi_ps(w128, w128); // [w2,w2,w3,w3]
            let w256 = _mm256_set_m128(w_hi, w_lo);
            let result = _mm256_mul_ps(v, w256);
            let out_ptr = output.as_mut_ptr().add(i) as *mut f32;
            _mm256_storeu_ps(out_ptr, result);
            i += 4;
        }
        while i < n {
            output[i] = Complex32::new(input[i].re * window[i], input[i].im * window[i]);
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> Vec<Complex32> {
        (0..64)
            .map(|i| Complex32::new(i as f32 * 0.1, -(i as f32) * 0.2))
            .collect()
    }

    #[test]
    fn scalar_and_dispatched_mag_squared_agree() {
        let input = sample_input();
        let mut scalar_out = vec![0.0f32; input.len()];
        let mut dispatched_out = vec![0.0f32; input.len()];
        scalar::mag_squared(&input, &mut scalar_out);
        (kernels().mag_squared)(&input, &mut dispatched_out);
        for (a, b) in scalar_out.iter().zip(dispatched_out.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn scalar_and_dispatched_window_multiply_agree() {
        let input = sample_input();
        let window: Vec<f32> = (0..input.len()).map(|i| 1.0 / (i as f32 + 1.0)).collect();
        let mut scalar_out = vec![Complex32::new(0.0, 0.0); input.len()];
        let mut dispatched_out = vec![Complex32::new(0.0, 0.0); input.len()];
        scalar::window_multiply(&input, &window, &mut scalar_out);
        (kernels().window_multiply)(&input, &window, &mut dispatched_out);
        for (a, b) in scalar_out.iter().zip(dispatched_out.iter()) {
            assert!((a - b).norm() < 1e-4);
        }
    }

    #[test]
    fn fftshift_mag_squared_moves_dc_to_center() {
        let mut input = vec![Complex32::new(0.0, 0.0); 8];
        input[0] = Complex32::new(2.0, 0.0);
        let mut out = vec![0.0f32; 8];
        (kernels().fftshift_mag_squared)(&input, &mut out);
        assert!((out[4] - 4.0).abs() < 1e-5);
    }

    #[test]
    fn relative_magnitude_handles_zero_baseline() {
        let mag = [1.0, 2.0];
        let baseline = [0.0, 4.0];
        let mut out = [0.0; 2];
        scalar::relative_magnitude(&mag, &baseline, &mut out);
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }
}
