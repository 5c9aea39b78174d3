use crate::signal::RRSeries;
use serde::{Deserialize, Serialize};

const PNN50_THRESHOLD_S: f64 = 0.050;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HRVTime {
    pub n: usize,
    pub avnn: f64,
    pub sdnn: f64,
    pub rmssd: f64,
    pub pnn50: f64,
    pub mean_hr: f64,
}

fn successive_differences(rr: &[f64]) -> impl Iterator<Item = f64> + '_ {
    rr.windows(2).map(|w| w[1] - w[0])
}

/// Root mean square of successive differences. Zero for fewer than two intervals.
pub fn rmssd(rr: &[f64]) -> f64 {
    if rr.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = successive_differences(rr).map(|d| d * d).sum();
    (sum_sq / (rr.len() - 1) as f64).sqrt()
}

/// Time-domain summary of an RR series; every statistic is 0 when undefined.
pub fn hrv_time(rr: &RRSeries) -> HRVTime {
    let n = rr.len();
    let avnn = rr.mean().unwrap_or(0.0);
    let (sdnn, pnn50) = if n > 1 {
        let dof = (n - 1) as f64;
        let var = rr.rr.iter().map(|x| (x - avnn).powi(2)).sum::<f64>() / dof;
        let large_steps = successive_differences(&rr.rr)
            .filter(|d| d.abs() > PNN50_THRESHOLD_S)
            .count();
        (var.sqrt(), large_steps as f64 / dof)
    } else {
        (0.0, 0.0)
    };
    HRVTime {
        n,
        avnn,
        sdnn,
        rmssd: rmssd(&rr.rr),
        pnn50,
        mean_hr: rr.mean_heart_rate().unwrap_or(0.0),
    }
}
