use criterion::{black_box, criterion_group, criterion_main, Criterion};
use iridium_receiver::config::ReceiverConfig;
use iridium_receiver::detector::BurstDetector;
use num_complex::Complex32;

fn test_config() -> ReceiverConfig {
    ReceiverConfig {
        sample_rate_hz: 1_000_000.0,
        fft_size: Some(1024),
        noise_history_len: 16,
        detection_threshold_db: 10.0,
        burst_width_hz: 40_000.0,
        ..ReceiverConfig::default()
    }
}

fn noise_frame(fft_size: usize, amplitude: f32) -> Vec<Complex32> {
    (0..fft_size)
        .map(|i| {
            let phase = i as f32 * 0.37;
            Complex32::new(amplitude * phase.cos(), amplitude * phase.sin() * 0.3)
        })
        .collect()
}

fn tone_frame(fft_size: usize, k: usize, amplitude: f32) -> Vec<Complex32> {
    (0..fft_size)
        .map(|n| {
            let theta = 2.0 * std::f32::consts::PI * (k as f32) * (n as f32) / (fft_size as f32);
            Complex32::new(amplitude * theta.cos(), amplitude * theta.sin())
        })
        .collect()
}

fn bench_primed_quiescent_frame(c: &mut Criterion) {
    let config = test_config();
    let fft_size = config.effective_fft_size();
    let mut detector = BurstDetector::new(&config);
    for _ in 0..config.noise_history_len {
        detector.push_samples(&noise_frame(fft_size, 0.01));
    }
    let frame = noise_frame(fft_size, 0.01);

    c.bench_function("detector_primed_quiescent_frame", |b| {
        b.iter(|| detector.push_samples(black_box(&frame)))
    });
}

fn bench_primed_active_burst_frame(c: &mut Criterion) {
    let config = test_config();
    let fft_size = config.effective_fft_size();
    let mut detector = BurstDetector::new(&config);
    for _ in 0..config.noise_history_len {
        detector.push_samples(&noise_frame(fft_size, 0.01));
    }
    let frame = tone_frame(fft_size, 200, 5.0);

    c.bench_function("detector_primed_active_burst_frame", |b| {
        b.iter(|| detector.push_samples(black_box(&frame)))
    });
}

criterion_group!(benches, bench_primed_quiescent_frame, bench_primed_active_burst_frame);
criterion_main!(benches);
