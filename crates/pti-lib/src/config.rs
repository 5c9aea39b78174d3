use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Thresholds and weights for the peak → RR → trust-score chain.
///
/// Every field has a default, so a TOML file only needs the values it overrides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PtiConfig {
    /// Minimum amplitude of a reported peak (signal units).
    pub min_height: f64,
    /// Minimum peak spacing in seconds; converted to `ceil(factor * fs)` samples.
    pub min_peak_spacing_factor: f64,
    /// Exclusive lower bound for a plausible RR interval (seconds).
    pub min_interval_s: f64,
    /// Exclusive upper bound for a plausible RR interval (seconds).
    pub max_interval_s: f64,
    /// Scoring window length (seconds).
    pub window_size_s: f64,
    /// Distance between consecutive window starts (seconds).
    pub step_size_s: f64,
    /// Below this many intervals nothing is scored.
    pub min_intervals: usize,
    /// Windows holding this many intervals or fewer are skipped.
    pub min_window_intervals: usize,
    /// Exclusive lower bound of the plausible instantaneous rate (BPM).
    pub plausible_bpm_low: f64,
    /// Exclusive upper bound of the plausible instantaneous rate (BPM).
    pub plausible_bpm_high: f64,
    /// Gain applied to RMSSD in the stability term `1 / (1 + gain * rmssd)`.
    pub stability_gain: f64,
    /// Weight of signal integrity in the composite score.
    pub integrity_weight: f64,
    /// Weight of physiologic plausibility in the composite score.
    pub plausibility_weight: f64,
    /// Weight of rhythm stability in the composite score.
    pub stability_weight: f64,
}

impl Default for PtiConfig {
    fn default() -> Self {
        Self {
            min_height: 0.5,
            min_peak_spacing_factor: 0.4,
            min_interval_s: 0.3,
            max_interval_s: 2.0,
            window_size_s: 30.0,
            step_size_s: 5.0,
            min_intervals: 10,
            min_window_intervals: 5,
            plausible_bpm_low: 40.0,
            plausible_bpm_high: 180.0,
            stability_gain: 10.0,
            integrity_weight: 0.4,
            plausibility_weight: 0.3,
            stability_weight: 0.3,
        }
    }
}

impl PtiConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: PtiConfig = toml::from_str(text).context("parsing PTI config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("in {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        finite("min_height", self.min_height)?;
        finite("max_interval_s", self.max_interval_s)?;
        finite("plausible_bpm_low", self.plausible_bpm_low)?;
        finite("plausible_bpm_high", self.plausible_bpm_high)?;
        positive("window_size_s", self.window_size_s)?;
        positive("step_size_s", self.step_size_s)?;
        non_negative("min_peak_spacing_factor", self.min_peak_spacing_factor)?;
        non_negative("min_interval_s", self.min_interval_s)?;
        non_negative("stability_gain", self.stability_gain)?;
        non_negative("integrity_weight", self.integrity_weight)?;
        non_negative("plausibility_weight", self.plausibility_weight)?;
        non_negative("stability_weight", self.stability_weight)?;
        ordered(
            ("min_interval_s", self.min_interval_s),
            ("max_interval_s", self.max_interval_s),
        )?;
        ordered(
            ("plausible_bpm_low", self.plausible_bpm_low),
            ("plausible_bpm_high", self.plausible_bpm_high),
        )?;
        Ok(())
    }

    /// Minimum distance between two peaks, in samples.
    pub fn min_peak_spacing_samples(&self, fs: f64) -> usize {
        let samples = (self.min_peak_spacing_factor * fs).ceil();
        if samples.is_finite() && samples >= 1.0 {
            samples as usize
        } else {
            1
        }
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn ordered(low: (&'static str, f64), high: (&'static str, f64)) -> Result<(), ConfigError> {
    if low.1 < high.1 {
        Ok(())
    } else {
        Err(ConfigError::EmptyRange {
            low_field: low.0,
            low: low.1,
            high_field: high.0,
            high: high.1,
        })
    }
}
