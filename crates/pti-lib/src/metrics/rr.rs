use crate::{
    config::PtiConfig,
    signal::{Events, RRSeries},
};
use log::{debug, warn};

/// RR intervals with the default plausibility bounds `(0.3 s, 2.0 s)`.
pub fn compute_clean_rr(events: &Events, fs: f64) -> RRSeries {
    compute_clean_rr_with_config(events, fs, &PtiConfig::default())
}

/// Consecutive peak differences in seconds, keeping only intervals strictly
/// inside `(min_interval_s, max_interval_s)`. Order is preserved; excised
/// intervals leave no gap in the output.
pub fn compute_clean_rr_with_config(events: &Events, fs: f64, cfg: &PtiConfig) -> RRSeries {
    if !(fs.is_finite() && fs > 0.0) {
        warn!("sampling rate {} is not usable for RR extraction", fs);
        return RRSeries::default();
    }
    let raw = RRSeries::from_events(events, fs);
    let rr: Vec<f64> = raw
        .rr
        .iter()
        .copied()
        .filter(|&interval| interval > cfg.min_interval_s && interval < cfg.max_interval_s)
        .collect();
    debug!(
        "RR extraction: {} raw intervals, {} within ({}, {}) s",
        raw.len(),
        rr.len(),
        cfg.min_interval_s,
        cfg.max_interval_s
    );
    RRSeries { rr }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_plausible_intervals_in_order() {
        // intervals at fs=100: 0.8, 0.2, 1.0, 2.5, 0.9
        let events = Events::from_indices(vec![0, 80, 100, 200, 450, 540]);
        let rr = compute_clean_rr(&events, 100.0);
        assert_eq!(rr.rr, vec![0.8, 1.0, 0.9]);
    }

    #[test]
    fn bounds_are_exclusive() {
        let events = Events::from_indices(vec![0, 30, 230, 330]);
        let rr = compute_clean_rr(&events, 100.0);
        assert_eq!(rr.rr, vec![1.0]);
    }

    #[test]
    fn every_interval_within_bounds() {
        let indices: Vec<usize> = (0..200).map(|i| i * i % 977 + i * 90).collect();
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        sorted.dedup();
        let rr = compute_clean_rr(&Events::from_indices(sorted), 360.0);
        assert!(rr.rr.iter().all(|&v| v > 0.3 && v < 2.0));
    }

    #[test]
    fn custom_bounds_apply() {
        let cfg = PtiConfig {
            min_interval_s: 0.5,
            max_interval_s: 1.5,
            ..PtiConfig::default()
        };
        let events = Events::from_indices(vec![0, 40, 140, 300]);
        let rr = compute_clean_rr_with_config(&events, 100.0, &cfg);
        assert_eq!(rr.rr, vec![1.0]);
    }

    #[test]
    fn too_few_peaks_give_empty_series() {
        assert!(compute_clean_rr(&Events::default(), 360.0).is_empty());
        assert!(compute_clean_rr(&Events::from_indices(vec![10]), 360.0).is_empty());
        assert!(compute_clean_rr(&Events::from_indices(vec![0, 300]), 0.0).is_empty());
    }
}
