//! Zero-phase Butterworth band-pass for raw ECG before peak detection.

use crate::signal::TimeSeries;
use log::{debug, warn};
use std::f64::consts::PI;

pub const DEFAULT_LOWCUT_HZ: f64 = 0.5;
pub const DEFAULT_HIGHCUT_HZ: f64 = 40.0;

/// Order of each edge of the band. Even, so every pole has a conjugate partner.
const ORDER: usize = 4;

/// Second-order section in Direct Form II transposed.
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b: [f64; 3],
    a1: f64,
    a2: f64,
}

impl Biquad {
    fn dc_gain(&self) -> f64 {
        (self.b[0] + self.b[1] + self.b[2]) / (1.0 + self.a1 + self.a2)
    }

    /// Filters in place, starting from the steady state for the first sample
    /// so a constant input produces no start-up transient.
    fn apply(&self, data: &mut [f64]) {
        let Some(&first) = data.first() else {
            return;
        };
        let settled = self.dc_gain() * first;
        let mut s1 = self.b[2] * first - self.a2 * settled;
        let mut s0 = self.b[1] * first - self.a1 * settled + s1;
        for x in data.iter_mut() {
            let input = *x;
            let out = self.b[0] * input + s0;
            s0 = self.b[1] * input - self.a1 * out + s1;
            s1 = self.b[2] * input - self.a2 * out;
            *x = out;
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Edge {
    Low,
    High,
}

/// Butterworth sections via the bilinear transform with a prewarped cutoff.
fn butterworth(fs: f64, cutoff: f64, edge: Edge) -> Vec<Biquad> {
    let k = 2.0 * fs;
    let wc = k * (PI * cutoff / fs).tan();
    let (k2, wc2) = (k * k, wc * wc);
    (0..ORDER / 2)
        .map(|i| {
            // upper-half-plane pole; the section carries its conjugate
            let theta = PI * (2 * i + ORDER + 1) as f64 / (2 * ORDER) as f64;
            let re = wc * theta.cos();
            let d = k2 - 2.0 * k * re + wc2;
            let b = match edge {
                Edge::Low => [wc2 / d, 2.0 * wc2 / d, wc2 / d],
                Edge::High => [k2 / d, -2.0 * k2 / d, k2 / d],
            };
            Biquad {
                b,
                a1: 2.0 * (wc2 - k2) / d,
                a2: (k2 + 2.0 * k * re + wc2) / d,
            }
        })
        .collect()
}

/// Runs the cascade forward then backward over an odd extension of the
/// signal, cancelling the phase shift of a single pass.
fn filtfilt(sections: &[Biquad], data: &[f64]) -> Vec<f64> {
    let (Some(&first), Some(&last)) = (data.first(), data.last()) else {
        return Vec::new();
    };
    let n = data.len();
    let pad = (3 * (2 * ORDER + 1)).min(n - 1);
    let mut ext = Vec::with_capacity(n + 2 * pad);
    ext.extend((1..=pad).rev().map(|i| 2.0 * first - data[i]));
    ext.extend_from_slice(data);
    ext.extend((n - 1 - pad..n - 1).rev().map(|i| 2.0 * last - data[i]));

    for section in sections {
        section.apply(&mut ext);
    }
    ext.reverse();
    for section in sections {
        section.apply(&mut ext);
    }
    ext.reverse();
    ext.drain(pad..pad + n).collect()
}

/// Order-4 Butterworth band-pass applied with zero phase, so R-peaks stay
/// on the samples they were recorded at. A low cutoff at or below zero
/// drops the high-pass edge; a high cutoff at or below zero, or at
/// Nyquist and above, drops the low-pass edge.
pub fn bandpass(ts: &TimeSeries, low_hz: f64, high_hz: f64) -> TimeSeries {
    if ts.is_empty() || !(ts.fs.is_finite() && ts.fs > 0.0) {
        if !ts.is_empty() {
            warn!("sampling rate {} is not usable for filtering", ts.fs);
        }
        return ts.clone();
    }
    let nyquist = 0.5 * ts.fs;
    let usable = |f: f64| f > 0.0 && f < nyquist;
    let mut sections = Vec::with_capacity(ORDER);
    if usable(high_hz) {
        sections.extend(butterworth(ts.fs, high_hz, Edge::Low));
    }
    if usable(low_hz) {
        sections.extend(butterworth(ts.fs, low_hz, Edge::High));
    }
    if sections.is_empty() {
        debug!("band {}..{} Hz leaves nothing to filter at {} Hz", low_hz, high_hz, ts.fs);
        return ts.clone();
    }
    TimeSeries {
        fs: ts.fs,
        data: filtfilt(&sections, &ts.data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{detectors::peaks::detect_r_peaks, testing::synthetic_ecg};

    fn tone(fs: f64, hz: f64, seconds: f64) -> TimeSeries {
        let n = (fs * seconds) as usize;
        TimeSeries {
            fs,
            data: (0..n).map(|i| (2.0 * PI * hz * i as f64 / fs).sin()).collect(),
        }
    }

    fn peak_abs(data: &[f64]) -> f64 {
        data.iter().fold(0.0, |m, v| m.max(v.abs()))
    }

    #[test]
    fn removes_constant_offset() {
        let ts = TimeSeries {
            fs: 360.0,
            data: vec![3.0; 3600],
        };
        let out = bandpass(&ts, DEFAULT_LOWCUT_HZ, DEFAULT_HIGHCUT_HZ);
        assert_eq!(out.len(), ts.len());
        assert!(out.data.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn beats_survive_filtering() {
        let rr = [0.8; 12];
        let (ts, beats) = synthetic_ecg(360.0, &rr);
        let out = bandpass(&ts, DEFAULT_LOWCUT_HZ, DEFAULT_HIGHCUT_HZ);
        let events = detect_r_peaks(&out);
        assert_eq!(events.len(), beats.len());
    }

    #[test]
    fn pulse_peak_stays_on_its_sample() {
        let fs = 250.0;
        let data: Vec<f64> = (0..1001)
            .map(|i| {
                let dt = (i as f64 - 500.0) / fs;
                (-0.5 * (dt / 0.02).powi(2)).exp()
            })
            .collect();
        let out = bandpass(&TimeSeries { fs, data }, DEFAULT_LOWCUT_HZ, DEFAULT_HIGHCUT_HZ);
        let argmax = out
            .data
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0;
        assert_eq!(argmax, 500);
    }

    #[test]
    fn passes_the_band_and_rejects_above_it() {
        let fs = 500.0;
        let inside = bandpass(&tone(fs, 10.0, 10.0), DEFAULT_LOWCUT_HZ, DEFAULT_HIGHCUT_HZ);
        let above = bandpass(&tone(fs, 100.0, 10.0), DEFAULT_LOWCUT_HZ, DEFAULT_HIGHCUT_HZ);
        // interior only, away from edge transients
        let interior = 1500..3500;
        let kept = peak_abs(&inside.data[interior.clone()]);
        assert!((0.95..=1.05).contains(&kept), "10 Hz amplitude {kept}");
        let leaked = peak_abs(&above.data[interior]);
        assert!(leaked < 0.01, "100 Hz amplitude {leaked}");
    }

    #[test]
    fn disabled_stages_pass_through() {
        let ts = TimeSeries {
            fs: 100.0,
            data: vec![0.0, 1.0, 0.0, -1.0],
        };
        let out = bandpass(&ts, 0.0, 50.0);
        assert_eq!(out.data, ts.data);
    }

    #[test]
    fn single_sample_survives() {
        let ts = TimeSeries {
            fs: 250.0,
            data: vec![2.0],
        };
        let out = bandpass(&ts, DEFAULT_LOWCUT_HZ, DEFAULT_HIGHCUT_HZ);
        assert_eq!(out.len(), 1);
        assert!(out.data[0].abs() < 1e-9);
    }
}
