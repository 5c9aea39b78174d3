use crate::signal::TimeSeries;
use std::f64::consts::PI;

/// Gaussian R-waves on a slow sine baseline. Returns the series and the
/// sample index of every beat; the first beat sits at 0.5 s.
pub(crate) fn synthetic_ecg(fs: f64, rr: &[f64]) -> (TimeSeries, Vec<usize>) {
    let mut beats = Vec::with_capacity(rr.len() + 1);
    let mut t = 0.5;
    beats.push(t);
    for &interval in rr {
        t += interval;
        beats.push(t);
    }
    let duration = beats.last().copied().unwrap_or(1.0) + 1.0;
    let samples = (duration * fs) as usize;
    let mut data = Vec::with_capacity(samples);
    for i in 0..samples {
        let time = i as f64 / fs;
        let mut v = 0.05 * (2.0 * PI * 1.0 * time).sin();
        for &bt in &beats {
            let width = 0.02;
            let amp = (-0.5 * ((time - bt) / width).powi(2)).exp();
            v += 1.2 * amp;
        }
        data.push(v);
    }
    let indices = beats.iter().map(|bt| (bt * fs).round() as usize).collect();
    (TimeSeries { fs, data }, indices)
}

/// Regular rhythm with the given interval repeated `beats - 1` times.
pub(crate) fn steady_ecg(fs: f64, interval: f64, beats: usize) -> TimeSeries {
    let rr = vec![interval; beats.saturating_sub(1)];
    synthetic_ecg(fs, &rr).0
}
