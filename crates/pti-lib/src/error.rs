use thiserror::Error;

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be finite and > 0, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f64 },
    #[error("{field} must be finite and >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{low_field} ({low}) must be below {high_field} ({high})")]
    EmptyRange {
        low_field: &'static str,
        low: f64,
        high_field: &'static str,
        high: f64,
    },
}
