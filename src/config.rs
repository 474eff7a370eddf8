//! Configuration surface for the receiver pipeline (spec §6).

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub const IRIDIUM_BASE_FREQ_HZ: f64 = 1_616_000_000.0;
pub const IRIDIUM_CHANNEL_WIDTH_HZ: f64 = 41_666.667;
pub const BLACKMAN_ENBW: f64 = 1.72;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    pub center_freq_hz: f64,
    pub sample_rate_hz: f64,
    pub detection_threshold_db: f64,
    /// `None` selects the power of two nearest `sample_rate_hz / 1000`.
    pub fft_size: Option<usize>,
    /// `None` selects `2 * fft_size`.
    pub burst_pre_roll_samples: Option<usize>,
    /// `None` selects `sample_rate_hz * 0.016`.
    pub burst_post_roll_samples: Option<usize>,
    pub burst_width_hz: f64,
    /// `None` selects 80% of the channel count spanning `sample_rate_hz`.
    pub max_bursts: Option<usize>,
    /// `None` selects `sample_rate_hz * 0.090`.
    pub max_burst_len_samples: Option<usize>,
    pub noise_history_len: usize,
    pub output_sample_rate_hz: f64,
    pub samples_per_symbol: f64,
    pub search_depth: usize,
    pub use_gpu: bool,
    pub use_simd: bool,
    pub use_gardner: bool,
    pub downmix_workers: usize,
    pub queue_capacity: usize,
    pub gsmtap_host: String,
    pub gsmtap_port: u16,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            center_freq_hz: 1_622_000_000.0,
            sample_rate_hz: 10_000_000.0,
            detection_threshold_db: 16.0,
            fft_size: None,
            burst_pre_roll_samples: None,
            burst_post_roll_samples: None,
            burst_width_hz: 40_000.0,
            max_bursts: None,
            max_burst_len_samples: None,
            noise_history_len: 512,
            output_sample_rate_hz: 153_125.0,
            samples_per_symbol: 6.125,
            search_depth: 1,
            use_gpu: false,
            use_simd: true,
            use_gardner: true,
            downmix_workers: 4,
            queue_capacity: 64,
            gsmtap_host: "127.0.0.1".to_string(),
            gsmtap_port: 4729,
        }
    }
}

impl ReceiverConfig {
    /// Power of two nearest `sample_rate_hz / 1000`, or the configured override.
    pub fn effective_fft_size(&self) -> usize {
        self.fft_size.unwrap_or_else(|| {
            let target = self.sample_rate_hz / 1000.0;
            nearest_power_of_two(target)
        })
    }

    pub fn effective_pre_roll(&self) -> usize {
        self.burst_pre_roll_samples
            .unwrap_or_else(|| 2 * self.effective_fft_size())
    }

    pub fn effective_post_roll(&self) -> usize {
        self.burst_post_roll_samples
            .unwrap_or_else(|| (self.sample_rate_hz * 0.016).round() as usize)
    }

    pub fn effective_max_burst_len(&self) -> usize {
        self.max_burst_len_samples
            .unwrap_or_else(|| (self.sample_rate_hz * 0.090).round() as usize)
    }

    pub fn channel_count(&self) -> usize {
        (self.sample_rate_hz / IRIDIUM_CHANNEL_WIDTH_HZ).floor() as usize
    }

    pub fn effective_max_bursts(&self) -> usize {
        self.max_bursts
            .unwrap_or_else(|| ((self.channel_count() as f64) * 0.8).round() as usize)
    }

    /// `threshold_linear = 10^(dB/10) / history_size / ENBW`.
    pub fn threshold_linear(&self) -> f64 {
        10f64.powf(self.detection_threshold_db / 10.0)
            / self.noise_history_len as f64
            / BLACKMAN_ENBW
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_hz <= 0.0 {
            return Err(ConfigError::InvalidSampleRate {
                rate: self.sample_rate_hz,
            });
        }
        if self.center_freq_hz <= 0.0 {
            return Err(ConfigError::InvalidCenterFrequency {
                freq: self.center_freq_hz,
            });
        }
        if self.output_sample_rate_hz > self.sample_rate_hz {
            return Err(ConfigError::InvalidDecimation {
                input: self.sample_rate_hz,
                output: self.output_sample_rate_hz,
            });
        }
        let fft_size = self.effective_fft_size();
        if !fft_size.is_power_of_two() {
            return Err(ConfigError::InvalidFftSize { size: fft_size });
        }
        if self.effective_max_bursts() == 0 {
            return Err(ConfigError::InvalidMaxBursts(0));
        }
        Ok(())
    }
}

fn nearest_power_of_two(target: f64) -> usize {
    if target <= 1.0 {
        return 1;
    }
    let lower = 1usize << (target.log2().floor() as u32);
    let upper = lower << 1;
    if (target - lower as f64).abs() <= (upper as f64 - target).abs() {
        lower
    } else {
        upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = ReceiverConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn fft_size_is_power_of_two() {
        let config = ReceiverConfig::default();
        assert!(config.effective_fft_size().is_power_of_two());
        // sample_rate_hz / 1000 = 10_000, nearest power of two is 8192 or 16384.
        assert_eq!(config.effective_fft_size(), 8192);
    }

    #[test]
    fn threshold_linearization_matches_spec_scenario() {
        let config = ReceiverConfig {
            noise_history_len: 512,
            detection_threshold_db: 16.0,
            ..ReceiverConfig::default()
        };
        let linear = config.threshold_linear();
        assert!((linear - 0.04529).abs() < 1e-4);
    }

    #[test]
    fn rejects_non_positive_sample_rate() {
        let config = ReceiverConfig {
            sample_rate_hz: 0.0,
            ..ReceiverConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSampleRate { .. })
        ));
    }

    #[test]
    fn rejects_output_rate_above_input_rate() {
        let config = ReceiverConfig {
            output_sample_rate_hz: 20_000_000.0,
            ..ReceiverConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDecimation { .. })
        ));
    }
}
