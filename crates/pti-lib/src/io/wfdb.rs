use crate::signal::{Events, TimeSeries};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// MIT annotation entry.
#[derive(Debug, Clone, PartialEq)]
pub struct WfdbAnnotation {
    pub sample: usize,
    pub code: u8,
}

impl WfdbAnnotation {
    /// Beat annotation codes occupy 1..=58; the rest mark rhythm, noise, etc.
    pub fn is_beat(&self) -> bool {
        self.code > 0 && self.code < 59
    }
}

/// Record name of a header path, e.g. `.../100.hea` -> `100`.
pub fn record_name(header_path: &Path) -> String {
    header_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| header_path.display().to_string())
}

/// Load one lead of a WFDB record in physical units: `(adc - baseline) / gain`.
pub fn load_wfdb_lead(header_path: &Path, lead: usize) -> Result<TimeSeries> {
    if !header_path.exists() {
        anyhow::bail!("WFDB header {} does not exist", header_path.display());
    }
    let (header, signals) = wfdb_rust::parse_wfdb(header_path);
    let (Some(signal_spec), true) = (header.signal_specs.get(lead), lead < signals.len()) else {
        anyhow::bail!(
            "record {} has {} signals, lead {} requested",
            record_name(header_path),
            signals.len(),
            lead
        );
    };
    let gain = match signal_spec.adc_gain.map(|g| g as f64) {
        Some(g) if g != 0.0 => g,
        _ => 1.0,
    };
    let baseline = signal_spec.baseline.or(signal_spec.adc_zero).unwrap_or(0) as f64;
    let fs = header.record.sampling_frequency.map_or(250.0, |f| f as f64);
    let data = signals[lead]
        .iter()
        .map(|&adc| (adc as f64 - baseline) / gain)
        .collect();
    Ok(TimeSeries { fs, data })
}

const SKIP: u8 = 59;
const NUM: u8 = 60;
const CHN: u8 = 62;
const AUX: u8 = 63;

/// Little-endian 16-bit words of an annotation stream.
struct Words<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl Words<'_> {
    fn next_word(&mut self) -> Option<u16> {
        let bytes = self.buf.get(self.pos..self.pos + 2)?;
        self.pos += 2;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn skip_bytes(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n);
    }
}

/// Decode an MIT-format annotation stream. Each word packs a 6-bit code
/// above a 10-bit sample delta; pseudo-codes adjust time or carry payload.
pub fn parse_wfdb_annotations(buf: &[u8]) -> Vec<WfdbAnnotation> {
    let mut words = Words { buf, pos: 0 };
    let mut out = Vec::new();
    let mut sample = 0usize;
    while let Some(word) = words.next_word() {
        let code = (word >> 10) as u8;
        let delta = usize::from(word & 0x03FF);
        match code {
            0 if delta == 0 => break,
            // 32-bit interval follows, high half first
            SKIP => {
                let (Some(high), Some(low)) = (words.next_word(), words.next_word()) else {
                    break;
                };
                let interval = (u32::from(high) << 16) | u32::from(low);
                sample = sample.wrapping_add(interval as usize);
            }
            NUM..=CHN => sample = sample.wrapping_add(delta),
            // payload padded to an even length
            AUX => words.skip_bytes(delta + delta % 2),
            _ => {
                sample = sample.wrapping_add(delta);
                out.push(WfdbAnnotation { sample, code });
            }
        }
    }
    out
}

/// Read an annotation file (e.g. `100.atr`) and keep the beat annotations.
pub fn load_wfdb_events(path: &Path) -> Result<Events> {
    let buf = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let beat_samples: Vec<usize> = parse_wfdb_annotations(&buf)
        .into_iter()
        .filter(WfdbAnnotation::is_beat)
        .map(|ann| ann.sample)
        .collect();
    Ok(Events::from_indices(beat_samples))
}
