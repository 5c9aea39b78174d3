use crate::{
    config::PtiConfig,
    detectors::peaks::detect_r_peaks_with_config,
    metrics::{
        hrv::{hrv_time, HRVTime},
        pti::{compute_pti_with_config, PtiCurve},
        rr::compute_clean_rr_with_config,
    },
    signal::{Events, RRSeries, TimeSeries},
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Everything the detector → extractor → scorer chain produced for one series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PtiPipelineResult {
    pub fs: f64,
    pub sample_count: usize,
    pub events: Events,
    pub rr: RRSeries,
    pub hrv: HRVTime,
    pub curve: PtiCurve,
    pub mean_pti: Option<f64>,
}

impl PtiPipelineResult {
    /// Score externally supplied beats (e.g. reference annotations).
    pub fn from_events(ts: &TimeSeries, events: Events, cfg: &PtiConfig) -> Self {
        let rr = compute_clean_rr_with_config(&events, ts.fs, cfg);
        let hrv = hrv_time(&rr);
        let curve = compute_pti_with_config(&rr, cfg);
        let mean_pti = curve.mean_score();
        debug!(
            "pipeline: {} beats, {} clean intervals, {} windows, mean PTI {:?}",
            events.len(),
            rr.len(),
            curve.len(),
            mean_pti
        );
        Self {
            fs: ts.fs,
            sample_count: ts.len(),
            events,
            rr,
            hrv,
            curve,
            mean_pti,
        }
    }
}

/// Detect beats in `ts`, clean the RR series and score it.
pub fn run_pti_pipeline(ts: &TimeSeries, cfg: &PtiConfig) -> PtiPipelineResult {
    let events = detect_r_peaks_with_config(ts, cfg);
    PtiPipelineResult::from_events(ts, events, cfg)
}
