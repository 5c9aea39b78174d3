//! Reproducible artifact injection for robustness experiments.

use crate::signal::TimeSeries;
use log::warn;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Standard deviation of the additive Gaussian motion artifact.
    pub motion_level: f64,
    /// Amplitude of the sinusoidal baseline drift.
    pub drift_strength: f64,
    /// Drift frequency in Hz.
    pub drift_hz: f64,
    pub seed: u64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            motion_level: 0.6,
            drift_strength: 0.5,
            drift_hz: 0.3,
            seed: 0,
        }
    }
}

impl NoiseConfig {
    pub fn with_seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }

    /// Motion artifact followed by baseline drift, drawn from a generator
    /// seeded with `self.seed`.
    pub fn apply(&self, ts: &TimeSeries) -> TimeSeries {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let noisy = add_motion_artifact(ts, self.motion_level, &mut rng);
        add_baseline_drift(&noisy, self.drift_strength, self.drift_hz)
    }
}

/// Add zero-mean Gaussian noise with standard deviation `level`.
pub fn add_motion_artifact<R: Rng + ?Sized>(ts: &TimeSeries, level: f64, rng: &mut R) -> TimeSeries {
    let normal = match Normal::new(0.0, level) {
        Ok(normal) if level > 0.0 => normal,
        Ok(_) => return ts.clone(),
        Err(err) => {
            warn!("motion artifact level {} rejected: {}", level, err);
            return ts.clone();
        }
    };
    TimeSeries {
        fs: ts.fs,
        data: ts.data.iter().map(|&x| x + normal.sample(rng)).collect(),
    }
}

/// Add `strength * sin(2π f t)` with `t = i / fs`.
pub fn add_baseline_drift(ts: &TimeSeries, strength: f64, freq_hz: f64) -> TimeSeries {
    let data = ts
        .data
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let t = i as f64 / ts.fs;
            x + strength * (2.0 * PI * freq_hz * t).sin()
        })
        .collect();
    TimeSeries { fs: ts.fs, data }
}
