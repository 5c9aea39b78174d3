use serde::{Deserialize, Serialize};

/// Uniformly sampled amplitude series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }

    /// Keep only the first `seconds` of the recording.
    pub fn truncate_seconds(&self, seconds: f64) -> Self {
        let samples = if seconds.is_finite() && seconds > 0.0 {
            ((seconds * self.fs) as usize).min(self.data.len())
        } else {
            0
        };
        Self {
            fs: self.fs,
            data: self.data[..samples].to_vec(),
        }
    }

    /// Sample index to seconds.
    pub fn time_of(&self, index: usize) -> f64 {
        index as f64 / self.fs
    }
}

/// Detected beats as sample indices, strictly increasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Events {
    pub indices: Vec<usize>,
}

impl Events {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }
    pub fn len(&self) -> usize {
        self.indices.len()
    }
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// RR intervals (seconds)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RRSeries {
    pub rr: Vec<f64>,
}

impl RRSeries {
    /// Raw consecutive differences, no plausibility filtering.
    pub fn from_events(events: &Events, fs: f64) -> Self {
        let rr = events
            .indices
            .windows(2)
            .map(|w| (w[1] as f64 - w[0] as f64) / fs)
            .collect();
        Self { rr }
    }

    pub fn len(&self) -> usize {
        self.rr.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rr.is_empty()
    }

    /// Elapsed time at which each interval ends (prefix sums).
    pub fn cumulative_times(&self) -> Vec<f64> {
        self.rr
            .iter()
            .scan(0.0, |acc, &interval| {
                *acc += interval;
                Some(*acc)
            })
            .collect()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.rr.is_empty() {
            return None;
        }
        Some(self.rr.iter().sum::<f64>() / self.rr.len() as f64)
    }

    /// Mean heart rate in BPM derived from the mean interval.
    pub fn mean_heart_rate(&self) -> Option<f64> {
        self.mean()
            .and_then(|mean| if mean > 0.0 { Some(60.0 / mean) } else { None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rr_from_events_divides_by_fs() {
        let events = Events::from_indices(vec![0, 250, 450, 700]);
        let rr = RRSeries::from_events(&events, 250.0);
        assert_eq!(rr.rr, vec![1.0, 0.8, 1.0]);
    }

    #[test]
    fn rr_from_single_event_is_empty() {
        let rr = RRSeries::from_events(&Events::from_indices(vec![42]), 360.0);
        assert!(rr.is_empty());
    }

    #[test]
    fn cumulative_times_are_prefix_sums() {
        let rr = RRSeries {
            rr: vec![0.5, 1.0, 0.75],
        };
        assert_eq!(rr.cumulative_times(), vec![0.5, 1.5, 2.25]);
    }

    #[test]
    fn heart_rate_from_mean_interval() {
        let rr = RRSeries { rr: vec![0.8; 4] };
        let hr = rr.mean_heart_rate().unwrap();
        assert!((hr - 75.0).abs() < 1e-9);
        assert_eq!(RRSeries::default().mean_heart_rate(), None);
    }

    #[test]
    fn truncate_keeps_leading_samples() {
        let ts = TimeSeries {
            fs: 10.0,
            data: (0..100).map(|i| i as f64).collect(),
        };
        let head = ts.truncate_seconds(2.5);
        assert_eq!(head.len(), 25);
        assert_eq!(head.data[24], 24.0);
        assert_eq!(ts.truncate_seconds(100.0).len(), 100);
        assert!(ts.truncate_seconds(-1.0).is_empty());
    }
}
