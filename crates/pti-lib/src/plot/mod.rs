//! Backend-neutral figure description; the CLI renders these with plotters.

use crate::{
    metrics::pti::PtiCurve,
    signal::{Events, RRSeries, TimeSeries},
};
use serde::{Deserialize, Serialize};

pub const CLEAN_COLOR: u32 = 0x1F77B4;
pub const NOISY_COLOR: u32 = 0xFF7F0E;
pub const PEAK_COLOR: u32 = 0xD62728;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
    /// Fixed `[min, max]`; derived from the data when `None`.
    pub range: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    /// Markers only, `style.width` is the marker radius.
    Points(LineSeries),
}

impl Series {
    pub fn data(&self) -> &LineSeries {
        match self {
            Series::Line(s) | Series::Points(s) => s,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis {
                label: None,
                range: None,
            },
            y: Axis {
                label: None,
                range: None,
            },
            series: Vec::new(),
        }
    }

    pub fn with_labels(mut self, x: &str, y: &str) -> Self {
        self.x.label = Some(x.into());
        self.y.label = Some(y.into());
        self
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// `(x_min, x_max, y_min, y_max)` over all finite points, honouring
    /// fixed axis ranges. Degenerate spans are widened so a chart can be built.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let points = self
            .series
            .iter()
            .flat_map(|s| s.data().points.iter())
            .filter(|p| p[0].is_finite() && p[1].is_finite());
        let mut b = (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
        for p in points {
            b.0 = b.0.min(p[0]);
            b.1 = b.1.max(p[0]);
            b.2 = b.2.min(p[1]);
            b.3 = b.3.max(p[1]);
        }
        let (x0, x1) = span(self.x.range, b.0, b.1);
        let (y0, y1) = span(self.y.range, b.2, b.3);
        (x0, x1, y0, y1)
    }
}

fn span(fixed: Option<[f64; 2]>, lo: f64, hi: f64) -> (f64, f64) {
    if let Some([a, b]) = fixed {
        return (a, b);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo < f64::EPSILON {
        return (lo - 0.5, hi + 0.5);
    }
    (lo, hi)
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        result.push(points[start]);
    }
    result
}

fn line(name: &str, points: Vec<[f64; 2]>, color: u32, width: f32) -> Series {
    Series::Line(LineSeries {
        name: name.into(),
        points,
        style: Style {
            width,
            color: Color(color),
        },
    })
}

/// Amplitude over time with detected peaks as markers.
pub fn figure_from_signal_with_peaks(
    title: &str,
    ts: &TimeSeries,
    events: &Events,
    max_points: usize,
) -> Figure {
    let points: Vec<[f64; 2]> = ts
        .data
        .iter()
        .enumerate()
        .map(|(i, value)| [ts.time_of(i), *value])
        .collect();
    let peaks: Vec<[f64; 2]> = events
        .indices
        .iter()
        .filter(|&&i| i < ts.len())
        .map(|&i| [ts.time_of(i), ts.data[i]])
        .collect();
    let mut fig = Figure::new(Some(title.into())).with_labels("Time (s)", "Amplitude");
    fig.add_series(line(
        "ECG",
        decimate_points(&points, max_points),
        CLEAN_COLOR,
        1.0,
    ));
    fig.add_series(Series::Points(LineSeries {
        name: "R-peaks".into(),
        points: peaks,
        style: Style {
            width: 3.0,
            color: Color(PEAK_COLOR),
        },
    }));
    fig
}

fn rr_points(rr: &RRSeries) -> Vec<[f64; 2]> {
    rr.rr
        .iter()
        .enumerate()
        .map(|(i, value)| [i as f64, *value])
        .collect()
}

/// Clean and noisy RR series against beat number.
pub fn figure_from_rr_pair(clean: &RRSeries, noisy: &RRSeries) -> Figure {
    let mut fig = Figure::new(Some("RR Intervals".to_string())).with_labels("Beat", "Seconds");
    fig.add_series(line("Clean RR", rr_points(clean), CLEAN_COLOR, 1.5));
    fig.add_series(line("Noisy RR", rr_points(noisy), NOISY_COLOR, 1.5));
    fig
}

fn pti_points(curve: &PtiCurve) -> Vec<[f64; 2]> {
    curve
        .windows
        .iter()
        .map(|w| [w.center_s, w.score])
        .collect()
}

fn format_mean(mean: Option<f64>) -> String {
    mean.map(|m| format!("{m:.3}")).unwrap_or_else(|| "n/a".into())
}

/// Clean and noisy trust curves on a fixed 0..1.1 axis, means in the title.
pub fn figure_from_pti_pair(clean: &PtiCurve, noisy: &PtiCurve) -> Figure {
    let title = format!(
        "Peak Trust Index (Clean: {} | Noisy: {})",
        format_mean(clean.mean_score()),
        format_mean(noisy.mean_score())
    );
    let mut fig = Figure::new(Some(title)).with_labels("Time (s)", "PTI");
    fig.y.range = Some([0.0, 1.1]);
    fig.add_series(line("Clean PTI", pti_points(clean), CLEAN_COLOR, 2.0));
    fig.add_series(line("Noisy PTI", pti_points(noisy), NOISY_COLOR, 2.0));
    fig
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::pti::PtiWindow;

    fn window(center_s: f64, score: f64) -> PtiWindow {
        PtiWindow {
            start_s: center_s - 15.0,
            center_s,
            n_intervals: 30,
            integrity: 1.0,
            plausibility: 1.0,
            stability: 1.0,
            score,
        }
    }

    #[test]
    fn decimation_caps_point_count() {
        let points: Vec<[f64; 2]> = (0..10_000).map(|i| [i as f64, 0.0]).collect();
        assert_eq!(decimate_points(&points, 500).len(), 500);
        assert_eq!(decimate_points(&points[..10], 500).len(), 10);
    }

    #[test]
    fn peaks_are_placed_on_the_signal() {
        let ts = TimeSeries {
            fs: 4.0,
            data: vec![0.0, 1.0, 0.0, 0.0, 2.0, 0.0],
        };
        let fig = figure_from_signal_with_peaks("ECG", &ts, &Events::from_indices(vec![1, 4, 99]), 100);
        let peaks = &fig.series[1];
        assert!(matches!(peaks, Series::Points(_)));
        assert_eq!(peaks.data().points, vec![[0.25, 1.0], [1.0, 2.0]]);
    }

    #[test]
    fn pti_title_reports_means() {
        let clean = PtiCurve {
            windows: vec![window(15.0, 0.9), window(20.0, 1.0)],
        };
        let fig = figure_from_pti_pair(&clean, &PtiCurve::default());
        assert_eq!(
            fig.title.as_deref(),
            Some("Peak Trust Index (Clean: 0.950 | Noisy: n/a)")
        );
        assert_eq!(fig.bounds().2, 0.0);
        assert_eq!(fig.bounds().3, 1.1);
    }

    #[test]
    fn bounds_survive_empty_and_flat_data() {
        let empty = figure_from_rr_pair(&RRSeries::default(), &RRSeries::default());
        assert_eq!(empty.bounds(), (0.0, 1.0, 0.0, 1.0));
        let flat = figure_from_rr_pair(&RRSeries { rr: vec![0.8; 3] }, &RRSeries::default());
        let (x0, x1, y0, y1) = flat.bounds();
        assert_eq!((x0, x1), (0.0, 2.0));
        assert!(y0 < 0.8 && y1 > 0.8);
    }

    #[test]
    fn color_splits_channels() {
        assert_eq!(Color(0x1F77B4).rgb(), (0x1F, 0x77, 0xB4));
    }
}
