//! Peak Trust Index: a sliding-window confidence score over an RR series.
//!
//! Each window mixes three terms:
//! - signal integrity: detected beats vs. beats implied by the mean interval,
//! - physiologic plausibility: share of beats with a believable instantaneous rate,
//! - rhythm stability: `1 / (1 + gain * RMSSD)`.

use crate::{config::PtiConfig, metrics::hrv::rmssd, signal::RRSeries};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// One scored window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PtiWindow {
    pub start_s: f64,
    /// `start_s + window_size_s / 2`, the x coordinate of the curve.
    pub center_s: f64,
    pub n_intervals: usize,
    pub integrity: f64,
    pub plausibility: f64,
    pub stability: f64,
    pub score: f64,
}

/// Scored windows in increasing time order. Sparse windows are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PtiCurve {
    pub windows: Vec<PtiWindow>,
}

impl PtiCurve {
    pub fn len(&self) -> usize {
        self.windows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
    pub fn centers(&self) -> Vec<f64> {
        self.windows.iter().map(|w| w.center_s).collect()
    }
    pub fn scores(&self) -> Vec<f64> {
        self.windows.iter().map(|w| w.score).collect()
    }

    /// Mean of the finite scores, `None` when nothing was scored.
    pub fn mean_score(&self) -> Option<f64> {
        let finite: Vec<f64> = self
            .windows
            .iter()
            .map(|w| w.score)
            .filter(|s| s.is_finite())
            .collect();
        if finite.is_empty() {
            None
        } else {
            Some(finite.iter().sum::<f64>() / finite.len() as f64)
        }
    }
}

/// Score `rr` with the given window and step (seconds), all other thresholds
/// at their defaults. Returns `(window_centers, scores)`; both are empty when
/// fewer than ten intervals are supplied.
pub fn compute_pti(rr: &RRSeries, window_size_s: f64, step_size_s: f64) -> (Vec<f64>, Vec<f64>) {
    let cfg = PtiConfig {
        window_size_s,
        step_size_s,
        ..PtiConfig::default()
    };
    let curve = compute_pti_with_config(rr, &cfg);
    (curve.centers(), curve.scores())
}

/// Slide `[start, start + window)` over the cumulative time of `rr` from 0 in
/// steps of `step_size_s` while `start + window < end`, so the last partial
/// window is never scored. Runs of empty windows are stepped over in one jump,
/// so long gaps cost nothing.
pub fn compute_pti_with_config(rr: &RRSeries, cfg: &PtiConfig) -> PtiCurve {
    if rr.len() < cfg.min_intervals {
        debug!(
            "PTI: {} intervals is below the floor of {}, nothing scored",
            rr.len(),
            cfg.min_intervals
        );
        return PtiCurve::default();
    }
    let window = cfg.window_size_s;
    let step = cfg.step_size_s;
    if !(window.is_finite() && window > 0.0 && step.is_finite() && step > 0.0) {
        warn!("PTI: window {} s / step {} s cannot be slid", window, step);
        return PtiCurve::default();
    }

    let times = rr.cumulative_times();
    let end_time = match times.last() {
        Some(&t) if t.is_finite() => t,
        Some(&t) => {
            warn!("PTI: RR series ends at {} s, nothing scored", t);
            return PtiCurve::default();
        }
        None => return PtiCurve::default(),
    };
    // negative intervals break the ordering binary search relies on
    let ordered = times.windows(2).all(|w| w[0] <= w[1]);

    let mut windows = Vec::new();
    let mut start = 0.0;
    while start + window < end_time {
        let end = start + window;
        let subset = window_intervals(&rr.rr, &times, start, end, ordered);
        if subset.is_empty() {
            let Some(next) = first_time_from(&times, end, ordered) else {
                break;
            };
            let skip = ((next - end) / step).floor().max(0.0) + 1.0;
            debug!(
                "PTI: no beats in [{:.1}, {:.1}) s, skipping {} windows",
                start, next, skip
            );
            start += skip * step;
            continue;
        }
        if let Some(scored) = score_window(&subset, start, cfg) {
            windows.push(scored);
        }
        start += step;
    }
    debug!(
        "PTI: {} windows scored over {:.1} s of RR data",
        windows.len(),
        end_time
    );
    PtiCurve { windows }
}

/// Intervals whose cumulative time lies in `[start, end)`.
fn window_intervals<'a>(
    rr: &'a [f64],
    times: &[f64],
    start: f64,
    end: f64,
    ordered: bool,
) -> Cow<'a, [f64]> {
    if ordered {
        let lo = times.partition_point(|&t| t < start);
        let hi = times.partition_point(|&t| t < end);
        Cow::Borrowed(&rr[lo..hi])
    } else {
        Cow::Owned(
            rr.iter()
                .zip(times)
                .filter(|(_, &t)| t >= start && t < end)
                .map(|(&interval, _)| interval)
                .collect(),
        )
    }
}

/// Earliest cumulative time at or after `from`.
fn first_time_from(times: &[f64], from: f64, ordered: bool) -> Option<f64> {
    if ordered {
        times.get(times.partition_point(|&t| t < from)).copied()
    } else {
        times
            .iter()
            .copied()
            .filter(|&t| t >= from)
            .fold(None, |min: Option<f64>, t| Some(min.map_or(t, |m| m.min(t))))
    }
}

fn score_window(subset: &[f64], start: f64, cfg: &PtiConfig) -> Option<PtiWindow> {
    if subset.len() <= cfg.min_window_intervals {
        debug!(
            "PTI: window at {:.1} s holds {} intervals, skipped",
            start,
            subset.len()
        );
        return None;
    }

    let Some(integrity) = signal_integrity(subset, cfg.window_size_s) else {
        debug!("PTI: window at {:.1} s has no usable mean interval", start);
        return None;
    };
    let plausibility =
        physiologic_plausibility(subset, cfg.plausible_bpm_low, cfg.plausible_bpm_high);
    let stability = rhythm_stability(subset, cfg.stability_gain);
    let score = cfg.integrity_weight * integrity
        + cfg.plausibility_weight * plausibility
        + cfg.stability_weight * stability;

    Some(PtiWindow {
        start_s: start,
        center_s: start + cfg.window_size_s / 2.0,
        n_intervals: subset.len(),
        integrity,
        plausibility,
        stability,
        score,
    })
}

/// `min(count / (window / mean), 1)`. `None` if the mean interval is not a
/// positive finite number.
pub fn signal_integrity(intervals: &[f64], window_size_s: f64) -> Option<f64> {
    if intervals.is_empty() {
        return None;
    }
    let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
    if !(mean.is_finite() && mean > 0.0) {
        return None;
    }
    let expected = window_size_s / mean;
    Some((intervals.len() as f64 / expected).min(1.0))
}

/// Fraction of intervals whose rate `60 / interval` lies strictly inside
/// `(low_bpm, high_bpm)`.
pub fn physiologic_plausibility(intervals: &[f64], low_bpm: f64, high_bpm: f64) -> f64 {
    if intervals.is_empty() {
        return 0.0;
    }
    let plausible = intervals
        .iter()
        .map(|&interval| 60.0 / interval)
        .filter(|&bpm| bpm > low_bpm && bpm < high_bpm)
        .count();
    plausible as f64 / intervals.len() as f64
}

/// `1 / (1 + gain * RMSSD)`: 1 for a perfectly regular rhythm, falling as
/// beat-to-beat variation grows.
pub fn rhythm_stability(intervals: &[f64], gain: f64) -> f64 {
    1.0 / (1.0 + gain * rmssd(intervals))
}
