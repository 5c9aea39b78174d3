pub mod config;
pub mod detectors;
pub mod error;
pub mod filters;
pub mod io;
pub mod metrics;
pub mod noise;
pub mod pipeline;
pub mod plot;
pub mod signal;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use config::PtiConfig;
pub use detectors::peaks::{detect_r_peaks, detect_r_peaks_with_config};
pub use error::ConfigError;
pub use metrics::pti::{compute_pti, compute_pti_with_config, PtiCurve, PtiWindow};
pub use metrics::rr::{compute_clean_rr, compute_clean_rr_with_config};
pub use pipeline::{run_pti_pipeline, PtiPipelineResult};
pub use signal::*;
