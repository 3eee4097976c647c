//! Monitor configuration.
//!
//! Defaults match the original deployment (5 calibration samples, 20
//! history entries, 1 Hz cadence). Values can be overridden through a
//! layered `config` file plus `GASWATCH_*` environment variables, or
//! programmatically through the builder.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use config::{Config, Environment, File};

use crate::channel::{default_thresholds, Thresholds};
use crate::history::DEFAULT_HISTORY_CAPACITY;

/// Configuration for the acquisition loop.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Valid readings to collect during baseline calibration.
    pub calibration_samples: usize,
    /// Pause between calibration read attempts.
    pub calibration_pause: Duration,
    /// Capacity of the history ring.
    pub history_capacity: usize,
    /// Pause after each published cycle; throttles publish frequency to
    /// the device's own sampling cadence.
    pub cycle_pause: Duration,
    /// Bound on a single device read.
    pub read_timeout: Duration,
    /// Wait after opening the device connection before the first read.
    pub settle_delay: Duration,
    /// Per-channel alert thresholds, in frame order.
    pub thresholds: Thresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            calibration_samples: 5,
            calibration_pause: Duration::from_secs(1),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            cycle_pause: Duration::from_secs(1),
            read_timeout: Duration::from_secs(1),
            settle_delay: Duration::from_secs(2),
            thresholds: default_thresholds(),
        }
    }
}

impl MonitorConfig {
    /// Create a builder for MonitorConfig.
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }

    /// Load configuration from an optional file layered with
    /// `GASWATCH_*` environment variables.
    ///
    /// Missing keys fall back to the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix("GASWATCH"))
            .build()?;
        Ok(Self::from_settings(&settings))
    }

    /// Apply overrides from a built `config::Config` on top of defaults.
    pub fn from_settings(settings: &Config) -> Self {
        let defaults = Self::default();

        let duration_ms = |key: &str, default: Duration| {
            settings
                .get::<u64>(key)
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        let mut thresholds = defaults.thresholds;
        if let Ok(values) = settings.get::<Vec<f64>>("thresholds") {
            if values.len() == thresholds.len() {
                thresholds.copy_from_slice(&values);
            }
        }

        Self {
            calibration_samples: settings
                .get::<usize>("calibration_samples")
                .unwrap_or(defaults.calibration_samples),
            calibration_pause: duration_ms("calibration_pause_ms", defaults.calibration_pause),
            history_capacity: settings
                .get::<usize>("history_capacity")
                .unwrap_or(defaults.history_capacity),
            cycle_pause: duration_ms("cycle_pause_ms", defaults.cycle_pause),
            read_timeout: duration_ms("read_timeout_ms", defaults.read_timeout),
            settle_delay: duration_ms("settle_delay_ms", defaults.settle_delay),
            thresholds,
        }
    }
}

/// Builder for MonitorConfig.
#[derive(Debug, Default)]
pub struct MonitorConfigBuilder {
    calibration_samples: Option<usize>,
    calibration_pause: Option<Duration>,
    history_capacity: Option<usize>,
    cycle_pause: Option<Duration>,
    read_timeout: Option<Duration>,
    settle_delay: Option<Duration>,
    thresholds: Option<Thresholds>,
}

impl MonitorConfigBuilder {
    /// Set the number of valid readings collected during calibration.
    pub fn calibration_samples(mut self, samples: usize) -> Self {
        self.calibration_samples = Some(samples);
        self
    }

    /// Set the pause between calibration read attempts.
    pub fn calibration_pause(mut self, pause: Duration) -> Self {
        self.calibration_pause = Some(pause);
        self
    }

    /// Set the history ring capacity.
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = Some(capacity);
        self
    }

    /// Set the pause between published cycles.
    pub fn cycle_pause(mut self, pause: Duration) -> Self {
        self.cycle_pause = Some(pause);
        self
    }

    /// Set the per-read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Set the post-connect settle delay.
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = Some(delay);
        self
    }

    /// Override the per-channel alert thresholds.
    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    /// Build the MonitorConfig.
    pub fn build(self) -> MonitorConfig {
        let defaults = MonitorConfig::default();
        MonitorConfig {
            calibration_samples: self
                .calibration_samples
                .unwrap_or(defaults.calibration_samples),
            calibration_pause: self.calibration_pause.unwrap_or(defaults.calibration_pause),
            history_capacity: self.history_capacity.unwrap_or(defaults.history_capacity),
            cycle_pause: self.cycle_pause.unwrap_or(defaults.cycle_pause),
            read_timeout: self.read_timeout.unwrap_or(defaults.read_timeout),
            settle_delay: self.settle_delay.unwrap_or(defaults.settle_delay),
            thresholds: self.thresholds.unwrap_or(defaults.thresholds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_deployment() {
        let config = MonitorConfig::default();
        assert_eq!(config.calibration_samples, 5);
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.cycle_pause, Duration::from_secs(1));
        assert_eq!(config.settle_delay, Duration::from_secs(2));
        assert_eq!(config.thresholds, [0.2, 0.02]);
    }

    #[test]
    fn builder_overrides_selected_fields() {
        let config = MonitorConfig::builder()
            .calibration_samples(3)
            .history_capacity(50)
            .cycle_pause(Duration::from_millis(250))
            .thresholds([0.5, 0.1])
            .build();

        assert_eq!(config.calibration_samples, 3);
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.cycle_pause, Duration::from_millis(250));
        assert_eq!(config.thresholds, [0.5, 0.1]);
        // Untouched fields keep their defaults.
        assert_eq!(config.read_timeout, Duration::from_secs(1));
    }

    #[test]
    fn settings_override_defaults() {
        let settings = Config::builder()
            .set_override("history_capacity", 40i64)
            .unwrap()
            .set_override("cycle_pause_ms", 500i64)
            .unwrap()
            .set_override("thresholds", vec![0.3, 0.04])
            .unwrap()
            .build()
            .unwrap();

        let config = MonitorConfig::from_settings(&settings);
        assert_eq!(config.history_capacity, 40);
        assert_eq!(config.cycle_pause, Duration::from_millis(500));
        assert_eq!(config.thresholds, [0.3, 0.04]);
        assert_eq!(config.calibration_samples, 5);
    }

    #[test]
    fn wrong_length_threshold_override_is_ignored() {
        let settings = Config::builder()
            .set_override("thresholds", vec![0.3])
            .unwrap()
            .build()
            .unwrap();

        let config = MonitorConfig::from_settings(&settings);
        assert_eq!(config.thresholds, default_thresholds());
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let config = MonitorConfig::load(None).unwrap();
        assert_eq!(config.calibration_samples, 5);
    }
}
