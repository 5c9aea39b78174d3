use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use pti_lib::{
    config::PtiConfig,
    detectors::peaks::detect_r_peaks_with_config,
    filters::{bandpass, DEFAULT_HIGHCUT_HZ, DEFAULT_LOWCUT_HZ},
    io::{text as text_io, wfdb as wfdb_io},
    metrics::{
        pti::{compute_pti_with_config, PtiWindow},
        rr::compute_clean_rr_with_config,
    },
    noise::NoiseConfig,
    pipeline::{run_pti_pipeline, PtiPipelineResult},
    plot::{self, Figure, Series},
    signal::{Events, RRSeries, TimeSeries},
    validation::{validate_records, write_report_tsv},
};
use serde::Serialize;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "pti",
    version,
    about = "PTI: Peak Trust Index for ECG R-peak reliability"
)]
struct Cli {
    /// TOML file overriding the default scoring parameters
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

/// Where an ECG comes from: newline-delimited samples (file or stdin) or a WFDB record.
#[derive(Args)]
struct SignalArgs {
    /// Sampling rate of text input; WFDB records carry their own
    #[arg(long, default_value_t = 250.0)]
    fs: f64,
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long, conflicts_with = "input")]
    wfdb_header: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    wfdb_lead: usize,
}

#[derive(Args)]
struct NoiseArgs {
    #[arg(long, default_value_t = 0.6)]
    motion_level: f64,
    #[arg(long, default_value_t = 0.5)]
    drift_strength: f64,
    #[arg(long, default_value_t = 0.3)]
    drift_hz: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

impl NoiseArgs {
    fn to_config(&self) -> NoiseConfig {
        NoiseConfig {
            motion_level: self.motion_level,
            drift_strength: self.drift_strength,
            drift_hz: self.drift_hz,
            seed: self.seed,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Detect R-peaks and print their sample indices
    FindPeaks {
        #[command(flatten)]
        signal: SignalArgs,
    },
    /// Turn peak indices (text or WFDB .atr) into plausibility-filtered RR intervals
    CleanRr {
        #[arg(long, default_value_t = 250.0)]
        fs: f64,
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Score newline-delimited RR intervals (seconds) with the sliding-window PTI
    Score {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        window_size: Option<f64>,
        #[arg(long)]
        step_size: Option<f64>,
    },
    /// Run peak detection → RR cleaning → PTI in one shot
    Pipeline {
        #[command(flatten)]
        signal: SignalArgs,
        /// Band-pass the signal before peak detection
        #[arg(long)]
        bandpass: bool,
        #[arg(long, default_value_t = DEFAULT_LOWCUT_HZ)]
        lowcut_hz: f64,
        #[arg(long, default_value_t = DEFAULT_HIGHCUT_HZ)]
        highcut_hz: f64,
        /// Reference beats (WFDB .atr or indices) used instead of detected peaks
        #[arg(long)]
        annotations: Option<PathBuf>,
    },
    /// Compare clean and noise-corrupted PTI across WFDB records
    Validate {
        #[arg(long = "wfdb-header", required = true, num_args = 1..)]
        wfdb_headers: Vec<PathBuf>,
        #[arg(long, default_value_t = 0)]
        wfdb_lead: usize,
        /// Only score the first N seconds of each record
        #[arg(long)]
        duration: Option<f64>,
        #[command(flatten)]
        noise: NoiseArgs,
        /// Per-record TSV report
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Render a four-panel clean/noisy comparison PNG for one record
    Dashboard {
        #[command(flatten)]
        signal: SignalArgs,
        #[command(flatten)]
        noise: NoiseArgs,
        #[arg(long, default_value_t = 120.0)]
        duration: f64,
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::FindPeaks { signal } => cmd_find_peaks(&signal, &cfg)?,
        Commands::CleanRr { fs, input } => cmd_clean_rr(fs, input.as_deref(), &cfg)?,
        Commands::Score {
            input,
            window_size,
            step_size,
        } => cmd_score(input.as_deref(), window_size, step_size, cfg)?,
        Commands::Pipeline {
            signal,
            bandpass: use_bandpass,
            lowcut_hz,
            highcut_hz,
            annotations,
        } => {
            let band = use_bandpass.then_some((lowcut_hz, highcut_hz));
            cmd_pipeline(&signal, band, annotations.as_deref(), &cfg)?
        }
        Commands::Validate {
            wfdb_headers,
            wfdb_lead,
            duration,
            noise,
            report,
        } => cmd_validate(
            &wfdb_headers,
            wfdb_lead,
            duration,
            &noise.to_config(),
            report.as_deref(),
            &cfg,
        )?,
        Commands::Dashboard {
            signal,
            noise,
            duration,
            out,
        } => cmd_dashboard(&signal, &noise.to_config(), duration, &out, &cfg)?,
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PtiConfig> {
    match path {
        Some(path) => PtiConfig::load(path),
        None => Ok(PtiConfig::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf)
}

fn read_samples(input: Option<&Path>) -> Result<Vec<f64>> {
    match input {
        Some(path) => text_io::read_f64_series(path),
        None => text_io::parse_f64_series(&read_stdin()?),
    }
}

fn load_time_series(signal: &SignalArgs) -> Result<TimeSeries> {
    if let Some(header) = &signal.wfdb_header {
        wfdb_io::load_wfdb_lead(header, signal.wfdb_lead)
    } else {
        let data = read_samples(signal.input.as_deref())?;
        Ok(TimeSeries {
            fs: signal.fs,
            data,
        })
    }
}

fn is_atr(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("atr"))
}

fn load_events(path: Option<&Path>) -> Result<Events> {
    match path {
        Some(path) if is_atr(path) => wfdb_io::load_wfdb_events(path),
        Some(path) => Ok(Events::from_indices(text_io::read_event_indices(path)?)),
        None => Ok(Events::from_indices(text_io::parse_event_indices(
            &read_stdin()?,
        )?)),
    }
}

fn cmd_find_peaks(signal: &SignalArgs, cfg: &PtiConfig) -> Result<()> {
    let ts = load_time_series(signal)?;
    let events = detect_r_peaks_with_config(&ts, cfg);
    print_json(&events)
}

fn cmd_clean_rr(fs: f64, input: Option<&Path>, cfg: &PtiConfig) -> Result<()> {
    let events = load_events(input)?;
    let rr = compute_clean_rr_with_config(&events, fs, cfg);
    print_json(&rr)
}

#[derive(Serialize)]
struct ScoreOutput {
    intervals: usize,
    centers: Vec<f64>,
    scores: Vec<f64>,
    mean_pti: Option<f64>,
    windows: Vec<PtiWindow>,
}

fn cmd_score(
    input: Option<&Path>,
    window_size: Option<f64>,
    step_size: Option<f64>,
    mut cfg: PtiConfig,
) -> Result<()> {
    if let Some(window) = window_size {
        cfg.window_size_s = window;
    }
    if let Some(step) = step_size {
        cfg.step_size_s = step;
    }
    cfg.validate().context("invalid window parameters")?;
    let rr = RRSeries {
        rr: read_samples(input)?,
    };
    let curve = compute_pti_with_config(&rr, &cfg);
    print_json(&ScoreOutput {
        intervals: rr.len(),
        centers: curve.centers(),
        scores: curve.scores(),
        mean_pti: curve.mean_score(),
        windows: curve.windows,
    })
}

fn cmd_pipeline(
    signal: &SignalArgs,
    band: Option<(f64, f64)>,
    annotations: Option<&Path>,
    cfg: &PtiConfig,
) -> Result<()> {
    let mut ts = load_time_series(signal)?;
    if let Some((low, high)) = band {
        ts = bandpass(&ts, low, high);
    }
    let result = match annotations {
        Some(path) => PtiPipelineResult::from_events(&ts, load_events(Some(path))?, cfg),
        None => run_pti_pipeline(&ts, cfg),
    };
    print_json(&result)
}

fn cmd_validate(
    headers: &[PathBuf],
    lead: usize,
    duration: Option<f64>,
    noise: &NoiseConfig,
    report: Option<&Path>,
    cfg: &PtiConfig,
) -> Result<()> {
    let mut records = Vec::with_capacity(headers.len());
    for header in headers {
        let mut ts = wfdb_io::load_wfdb_lead(header, lead)?;
        if let Some(seconds) = duration {
            ts = ts.truncate_seconds(seconds);
        }
        records.push((wfdb_io::record_name(header), ts));
    }
    let summary = validate_records(records, cfg, noise);
    if let Some(path) = report {
        write_report_tsv(path, &summary)?;
        info!("wrote validation report to {}", path.display());
    }
    print_json(&summary)
}

#[derive(Serialize)]
struct DashboardOutput {
    out: PathBuf,
    clean_mean_pti: Option<f64>,
    noisy_mean_pti: Option<f64>,
}

const DASHBOARD_MAX_POINTS: usize = 5000;

fn cmd_dashboard(
    signal: &SignalArgs,
    noise: &NoiseConfig,
    duration: f64,
    out: &Path,
    cfg: &PtiConfig,
) -> Result<()> {
    let clean_ts = load_time_series(signal)?.truncate_seconds(duration);
    let noisy_ts = noise.apply(&clean_ts);
    let clean = run_pti_pipeline(&clean_ts, cfg);
    let noisy = run_pti_pipeline(&noisy_ts, cfg);
    let figures = [
        plot::figure_from_signal_with_peaks(
            "Clean ECG with Detected Peaks",
            &clean_ts,
            &clean.events,
            DASHBOARD_MAX_POINTS,
        ),
        plot::figure_from_signal_with_peaks(
            "Noisy ECG with Detected Peaks",
            &noisy_ts,
            &noisy.events,
            DASHBOARD_MAX_POINTS,
        ),
        plot::figure_from_rr_pair(&clean.rr, &noisy.rr),
        plot::figure_from_pti_pair(&clean.curve, &noisy.curve),
    ];

    let root = BitMapBackend::new(out, (1200, 1600)).into_drawing_area();
    root.fill(&WHITE)?;
    for (area, fig) in root.split_evenly((figures.len(), 1)).iter().zip(&figures) {
        draw_plotters_figure(area, fig)?;
    }
    root.present()
        .with_context(|| format!("failed to write {}", out.display()))?;
    info!("wrote dashboard to {}", out.display());

    print_json(&DashboardOutput {
        out: out.to_path_buf(),
        clean_mean_pti: clean.mean_pti,
        noisy_mean_pti: noisy.mean_pti,
    })
}

fn draw_plotters_figure(area: &DrawingArea<BitMapBackend<'_>, Shift>, fig: &Figure) -> Result<()> {
    let (x_min, x_max, y_min, y_max) = fig.bounds();
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "Plot".into()),
            ("sans-serif", 20),
        )
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
    chart
        .configure_mesh()
        .x_desc(fig.x.label.clone().unwrap_or_default())
        .y_desc(fig.y.label.clone().unwrap_or_default())
        .draw()?;
    for series in &fig.series {
        let data = series.data();
        let (r, g, b) = data.style.color.rgb();
        let color = RGBColor(r, g, b);
        let finite = data
            .points
            .iter()
            .filter(|p| p[0].is_finite() && p[1].is_finite())
            .map(|p| (p[0], p[1]));
        match series {
            Series::Line(_) => {
                chart
                    .draw_series(LineSeries::new(
                        finite,
                        color.stroke_width(data.style.width.max(1.0) as u32),
                    ))?
                    .label(data.name.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }
            Series::Points(_) => {
                let radius = data.style.width.max(1.0) as u32;
                chart
                    .draw_series(finite.map(|p| Circle::new(p, radius, color.filled())))?
                    .label(data.name.clone())
                    .legend(move |(x, y)| Circle::new((x + 10, y), radius, color.filled()));
            }
        }
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}
