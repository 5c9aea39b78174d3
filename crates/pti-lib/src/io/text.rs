use anyhow::{Context, Result};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

/// Parse one value per line, skipping blank lines and `#` comments.
fn parse_lines<T>(text: &str, what: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val = trimmed
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("line {} is not {}: {}", idx + 1, what, trimmed))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no {} values found", what);
    }
    Ok(out)
}

fn read_lines<T>(path: &Path, what: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_lines(&text, what).with_context(|| format!("in {}", path.display()))
}

/// Amplitude samples or RR intervals, one per line.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    parse_lines(text, "a number")
}

pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    read_lines(path, "a number")
}

/// Sample indices of beats, one per line.
pub fn parse_event_indices(text: &str) -> Result<Vec<usize>> {
    parse_lines(text, "an integer index")
}

pub fn read_event_indices(path: &Path) -> Result<Vec<usize>> {
    read_lines(path, "an integer index")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blank_lines() {
        let values = parse_f64_series("# rr seconds\n0.8\n\n 0.81 \n# end\n0.79\n").unwrap();
        assert_eq!(values, vec![0.8, 0.81, 0.79]);
    }

    #[test]
    fn reports_offending_line() {
        let err = parse_f64_series("0.8\nabc\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse_f64_series("# nothing\n\n").is_err());
        assert!(parse_event_indices("").is_err());
    }

    #[test]
    fn indices_must_be_unsigned() {
        assert_eq!(parse_event_indices("10\n300\n").unwrap(), vec![10, 300]);
        assert!(parse_event_indices("-4\n").is_err());
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rr.txt");
        std::fs::write(&path, "0.9\n1.0\n").unwrap();
        assert_eq!(read_f64_series(&path).unwrap(), vec![0.9, 1.0]);
        let missing = dir.path().join("missing.txt");
        assert!(read_f64_series(&missing).is_err());
    }
}
