use crate::{
    config::PtiConfig,
    signal::{Events, TimeSeries},
};
use log::{debug, warn};
use std::cmp::Ordering;

/// Detect R-peaks with the default height (0.5) and spacing (0.4 s).
pub fn detect_r_peaks(ts: &TimeSeries) -> Events {
    detect_r_peaks_with_config(ts, &PtiConfig::default())
}

/// Detect R-peaks as local maxima that clear `min_height` and sit at least
/// `ceil(min_peak_spacing_factor * fs)` samples apart.
///
/// When two candidates are closer than the spacing the taller one survives;
/// at equal amplitude the earlier index wins. Degenerate input (fewer than
/// three samples, bad sampling rate, nothing above threshold) yields no events.
pub fn detect_r_peaks_with_config(ts: &TimeSeries, cfg: &PtiConfig) -> Events {
    if ts.len() < 3 {
        return Events::default();
    }
    if !(ts.fs.is_finite() && ts.fs > 0.0) {
        warn!("sampling rate {} is not usable for peak detection", ts.fs);
        return Events::default();
    }

    let data = &ts.data;
    let mut candidates = local_maxima(data);
    candidates.retain(|&i| data[i] >= cfg.min_height);
    let spacing = cfg.min_peak_spacing_samples(ts.fs);
    let peaks = select_by_distance(&candidates, data, spacing);
    debug!(
        "peak detector: {} candidates above {}, {} kept at spacing {} samples",
        candidates.len(),
        cfg.min_height,
        peaks.len(),
        spacing
    );
    Events::from_indices(peaks)
}

/// Indices of samples strictly greater than both neighbours. A flat top
/// bounded by lower samples on both sides reports its (lower) middle index.
/// The first and last samples never qualify.
fn local_maxima(data: &[f64]) -> Vec<usize> {
    let mut out = Vec::new();
    let last = data.len().saturating_sub(1);
    let mut i = 1;
    while i < last {
        if data[i - 1] < data[i] {
            let mut ahead = i + 1;
            while ahead < last && data[ahead] == data[i] {
                ahead += 1;
            }
            if data[ahead] < data[i] {
                out.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    out
}

/// Greedy suppression: visit candidates tallest first (earliest first on
/// ties) and drop every neighbour closer than `distance` samples.
fn select_by_distance(peaks: &[usize], data: &[f64], distance: usize) -> Vec<usize> {
    if peaks.len() < 2 || distance <= 1 {
        return peaks.to_vec();
    }

    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| {
        data[peaks[b]]
            .partial_cmp(&data[peaks[a]])
            .unwrap_or(Ordering::Equal)
            .then(peaks[a].cmp(&peaks[b]))
    });

    let mut keep = vec![true; peaks.len()];
    for &idx in &order {
        if !keep[idx] {
            continue;
        }
        let mut left = idx;
        while left > 0 && peaks[idx] - peaks[left - 1] < distance {
            left -= 1;
            keep[left] = false;
        }
        let mut right = idx + 1;
        while right < peaks.len() && peaks[right] - peaks[idx] < distance {
            keep[right] = false;
            right += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}
