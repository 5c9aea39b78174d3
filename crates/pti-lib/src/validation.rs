//! Clean-vs-noisy PTI comparison across a batch of records.

use crate::{
    config::PtiConfig, noise::NoiseConfig, pipeline::run_pti_pipeline, signal::TimeSeries,
};
use anyhow::{Context, Result};
use csv::WriterBuilder;
use log::info;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;
use std::fs;
use std::path::Path;

pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordComparison {
    pub record: String,
    pub clean_windows: usize,
    pub noisy_windows: usize,
    pub clean_mean: Option<f64>,
    pub noisy_mean: Option<f64>,
    /// `(clean - noisy) / clean * 100`
    pub percent_drop: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairedTTest {
    pub t_statistic: f64,
    pub p_value: f64,
    pub df: usize,
    pub significant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub records: Vec<RecordComparison>,
    pub avg_clean: Option<f64>,
    pub avg_noisy: Option<f64>,
    pub avg_percent_drop: Option<f64>,
    pub t_test: Option<PairedTTest>,
}

/// Score `ts` as recorded and again after `noise` is applied.
pub fn compare_record(
    name: &str,
    ts: &TimeSeries,
    cfg: &PtiConfig,
    noise: &NoiseConfig,
) -> RecordComparison {
    let clean = run_pti_pipeline(ts, cfg);
    let noisy = run_pti_pipeline(&noise.apply(ts), cfg);
    let clean_mean = clean.mean_pti;
    let noisy_mean = noisy.mean_pti;
    let percent_drop = match (clean_mean, noisy_mean) {
        (Some(c), Some(n)) if c != 0.0 => Some((c - n) / c * 100.0),
        _ => None,
    };
    RecordComparison {
        record: name.to_string(),
        clean_windows: clean.curve.len(),
        noisy_windows: noisy.curve.len(),
        clean_mean,
        noisy_mean,
        percent_drop,
    }
}

/// Compare every record; record `i` gets noise seed `noise.seed + i`.
pub fn validate_records<I>(records: I, cfg: &PtiConfig, noise: &NoiseConfig) -> ValidationSummary
where
    I: IntoIterator<Item = (String, TimeSeries)>,
{
    let comparisons = records
        .into_iter()
        .enumerate()
        .map(|(i, (name, ts))| {
            let record_noise = noise.with_seed(noise.seed.wrapping_add(i as u64));
            let cmp = compare_record(&name, &ts, cfg, &record_noise);
            info!(
                "record {}: clean PTI {:?}, noisy PTI {:?}, drop {:?}%",
                cmp.record, cmp.clean_mean, cmp.noisy_mean, cmp.percent_drop
            );
            cmp
        })
        .collect();
    summarize(comparisons)
}

pub fn summarize(records: Vec<RecordComparison>) -> ValidationSummary {
    let clean: Vec<f64> = records.iter().filter_map(|r| r.clean_mean).collect();
    let noisy: Vec<f64> = records.iter().filter_map(|r| r.noisy_mean).collect();
    let drops: Vec<f64> = records.iter().filter_map(|r| r.percent_drop).collect();
    let (paired_clean, paired_noisy): (Vec<f64>, Vec<f64>) = records
        .iter()
        .filter_map(|r| Some((r.clean_mean?, r.noisy_mean?)))
        .unzip();
    ValidationSummary {
        avg_clean: mean_of(&clean),
        avg_noisy: mean_of(&noisy),
        avg_percent_drop: mean_of(&drops),
        t_test: paired_t_test(&paired_clean, &paired_noisy),
        records,
    }
}

fn mean_of(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().mean())
    }
}

/// Two-sided paired t-test on `a[i] - b[i]`. `None` with fewer than two
/// pairs or when the differences have no spread.
pub fn paired_t_test(a: &[f64], b: &[f64]) -> Option<PairedTTest> {
    let diffs: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
    let n = diffs.len();
    if n < 2 {
        return None;
    }
    let mean = diffs.iter().mean();
    let sd = diffs.iter().std_dev();
    if !(sd.is_finite() && sd > 0.0) {
        return None;
    }
    let t_statistic = mean / (sd / (n as f64).sqrt());
    let df = n - 1;
    let dist = StudentsT::new(0.0, 1.0, df as f64).ok()?;
    let p_value = 2.0 * (1.0 - dist.cdf(t_statistic.abs()));
    Some(PairedTTest {
        t_statistic,
        p_value,
        df,
        significant: p_value < SIGNIFICANCE_LEVEL,
    })
}

/// One tab-separated row per record.
pub fn write_report_tsv(path: &Path, summary: &ValidationSummary) -> Result<()> {
    let file =
        fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new().delimiter(b'\t').from_writer(file);
    writer.write_record([
        "record",
        "clean_windows",
        "noisy_windows",
        "clean_pti",
        "noisy_pti",
        "percent_drop",
    ])?;
    let opt = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();
    for r in &summary.records {
        writer.write_record([
            r.record.clone(),
            r.clean_windows.to_string(),
            r.noisy_windows.to_string(),
            opt(r.clean_mean),
            opt(r.noisy_mean),
            opt(r.percent_drop),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::steady_ecg;

    fn comparison(name: &str, clean: Option<f64>, noisy: Option<f64>) -> RecordComparison {
        RecordComparison {
            record: name.into(),
            clean_windows: 1,
            noisy_windows: 1,
            clean_mean: clean,
            noisy_mean: noisy,
            percent_drop: match (clean, noisy) {
                (Some(c), Some(n)) => Some((c - n) / c * 100.0),
                _ => None,
            },
        }
    }

    #[test]
    fn noise_lowers_trust() {
        let ts = steady_ecg(250.0, 0.8, 90);
        let cmp = compare_record(
            "steady",
            &ts,
            &PtiConfig::default(),
            &NoiseConfig::default().with_seed(11),
        );
        let clean = cmp.clean_mean.expect("clean windows");
        let noisy = cmp.noisy_mean.expect("noisy windows");
        assert!(noisy < clean, "noisy {noisy} vs clean {clean}");
        assert!(cmp.percent_drop.unwrap() > 0.0);
    }

    #[test]
    fn comparison_is_reproducible() {
        let ts = steady_ecg(250.0, 0.8, 60);
        let noise = NoiseConfig::default().with_seed(5);
        let a = compare_record("a", &ts, &PtiConfig::default(), &noise);
        let b = compare_record("a", &ts, &PtiConfig::default(), &noise);
        assert_eq!(a, b);
    }

    #[test]
    fn paired_t_test_matches_hand_computation() {
        let clean = [1.0, 2.0, 3.0, 4.0, 5.0];
        let noisy = [0.5, 1.4, 2.6, 3.5, 4.5];
        let t = paired_t_test(&clean, &noisy).unwrap();
        assert_eq!(t.df, 4);
        assert!((t.t_statistic - 0.5 * 1000f64.sqrt()).abs() < 1e-6);
        assert!(t.p_value < 1e-3);
        assert!(t.significant);
        let reversed = paired_t_test(&noisy, &clean).unwrap();
        assert!((reversed.t_statistic + t.t_statistic).abs() < 1e-9);
        assert!((reversed.p_value - t.p_value).abs() < 1e-12);
    }

    #[test]
    fn paired_t_test_degenerate_cases() {
        assert_eq!(paired_t_test(&[0.9], &[0.8]), None);
        assert_eq!(paired_t_test(&[1.0, 2.0], &[0.5, 1.5]), None);
    }

    #[test]
    fn summary_skips_missing_means() {
        let summary = summarize(vec![
            comparison("100", Some(0.9), Some(0.6)),
            comparison("101", Some(0.8), None),
            comparison("102", Some(1.0), Some(0.8)),
        ]);
        assert!((summary.avg_clean.unwrap() - 0.9).abs() < 1e-12);
        assert!((summary.avg_noisy.unwrap() - 0.7).abs() < 1e-12);
        assert_eq!(summary.records.len(), 3);
        let t = summary.t_test.unwrap();
        assert_eq!(t.df, 1);
    }

    #[test]
    fn empty_batch_has_no_statistics() {
        let summary = summarize(Vec::new());
        assert_eq!(summary.avg_clean, None);
        assert_eq!(summary.t_test, None);
    }

    #[test]
    fn report_has_one_row_per_record() {
        let summary = summarize(vec![
            comparison("100", Some(0.9), Some(0.6)),
            comparison("101", None, None),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.tsv");
        write_report_tsv(&path, &summary).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("record\tclean_windows"));
        assert!(lines[1].starts_with("100\t1\t1\t0.900000\t0.600000"));
        assert!(lines[2].ends_with("\t\t\t"));
    }
}
