//! SimpleEQ CLI Application

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use simpleeq_core::domain::{
    AtomicParameterStore, ChainSettings, ConfigManager, EditorConfig, ParameterId,
    ParameterStore, PlotArea, ProcessingChain, ResponseCurve, ResponseCurveEditor,
    SharedSampleRate, Slope,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "simpleeq")]
#[command(about = "Frequency response tools for the SimpleEQ editor", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Editor config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample the response curve for the given settings and print it
    Curve(CurveArgs),

    /// Run the editor refresh loop against simulated automation
    Watch {
        /// Number of timer ticks to run
        #[arg(long, default_value_t = 120)]
        ticks: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Args)]
struct CurveArgs {
    /// Plot width in pixels (one point per pixel)
    #[arg(long)]
    width: Option<i32>,

    /// Sample rate in Hz
    #[arg(long)]
    sample_rate: Option<f64>,

    #[arg(long, default_value_t = 750.0)]
    peak_freq: f64,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    peak_gain: f64,

    #[arg(long, default_value_t = 1.0)]
    peak_q: f64,

    #[arg(long, default_value_t = 20.0)]
    low_cut: f64,

    /// Low-cut slope index: 0=12, 1=24, 2=36, 3=48 dB/oct
    #[arg(long, default_value_t = 0)]
    low_slope: usize,

    #[arg(long, default_value_t = 20000.0)]
    high_cut: f64,

    /// High-cut slope index: 0=12, 1=24, 2=36, 3=48 dB/oct
    #[arg(long, default_value_t = 0)]
    high_slope: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

impl CurveArgs {
    fn chain_settings(&self) -> anyhow::Result<ChainSettings> {
        let low_cut_slope = Slope::try_from_index(self.low_slope, ParameterId::LowCutSlope)?;
        let high_cut_slope = Slope::try_from_index(self.high_slope, ParameterId::HighCutSlope)?;

        let settings = ChainSettings {
            low_cut_slope,
            high_cut_slope,
            ..ChainSettings::default()
        }
        .with_parameter(ParameterId::PeakFreq, self.peak_freq)
        .with_parameter(ParameterId::PeakGain, self.peak_gain)
        .with_parameter(ParameterId::PeakQuality, self.peak_q)
        .with_parameter(ParameterId::LowCutFreq, self.low_cut)
        .with_parameter(ParameterId::HighCutFreq, self.high_cut);

        Ok(settings)
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn load_config(path: Option<PathBuf>) -> anyhow::Result<EditorConfig> {
    let manager = match path {
        Some(path) => ConfigManager::for_file(path),
        None => match ConfigManager::default_config_dir() {
            Ok(dir) => ConfigManager::new(dir),
            Err(e) => {
                debug!(error = %e, "No config directory, using defaults");
                return Ok(EditorConfig::default());
            }
        },
    };

    let config = manager.load().await;
    config.validate().context("editor configuration")?;
    Ok(config)
}

fn print_curve(curve: &ResponseCurve, format: OutputFormat) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, curve)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            writeln!(out, "x,y,frequency_hz,gain_db")?;
            for p in curve.points() {
                writeln!(out, "{},{},{},{}", p.x, p.y, p.frequency_hz, p.gain_db)?;
            }
        }
    }

    Ok(())
}

fn run_curve(config: &EditorConfig, args: &CurveArgs) -> anyhow::Result<()> {
    let sample_rate = args.sample_rate.unwrap_or(config.default_sample_rate);
    if !(sample_rate > 0.0 && sample_rate.is_finite()) {
        bail!("sample rate must be positive, got {sample_rate}");
    }

    let settings = args.chain_settings()?;
    let chain = ProcessingChain::from_settings(&settings, sample_rate);
    let area = PlotArea::new(0, 0, args.width.unwrap_or(config.plot_width), config.plot_height);
    let curve = config.sampler().sample(&chain.chains(), sample_rate, area);

    if let Some(peak) = curve.peak() {
        info!(
            points = curve.len(),
            "Curve sampled, max {:+.2} dB at {:.0} Hz",
            peak.gain_db,
            peak.frequency_hz
        );
    }

    print_curve(&curve, args.format)
}

/// Sweep the peak band back and forth like host automation would
async fn automate(store: Arc<AtomicParameterStore>) {
    let mut interval = tokio::time::interval(Duration::from_millis(50));
    let mut step: u32 = 0;

    loop {
        interval.tick().await;
        let phase = f64::from(step % 80) / 80.0;
        let t = if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 };

        // 100 Hz .. 10 kHz on a log scale
        store.set(ParameterId::PeakFreq, 100.0 * 100.0_f64.powf(t));
        store.set(ParameterId::PeakGain, 12.0 * (1.0 - 2.0 * t));
        step = step.wrapping_add(1);
    }
}

async fn run_watch(config: &EditorConfig, ticks: u32) -> anyhow::Result<()> {
    let store = Arc::new(AtomicParameterStore::new(ChainSettings {
        peak_quality: 2.0,
        low_cut_freq: 40.0,
        low_cut_slope: Slope::Db24,
        ..ChainSettings::default()
    }));
    let sample_rate = Arc::new(SharedSampleRate::new(config.default_sample_rate));
    let mut editor = ResponseCurveEditor::new(store.clone(), sample_rate, config);

    let automation = tokio::spawn(automate(store));

    let mut timer = tokio::time::interval(config.refresh_interval());
    let mut redraws = 0u32;
    for tick in 0..ticks {
        timer.tick().await;
        if let Some(curve) = editor.tick() {
            redraws += 1;
            if let Some(peak) = curve.peak() {
                info!(
                    tick,
                    "Redraw: max {:+.2} dB at {:.0} Hz",
                    peak.gain_db,
                    peak.frequency_hz
                );
            }
        }
    }

    automation.abort();
    info!(ticks, redraws, "Refresh loop finished");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    info!("SimpleEQ starting...");

    let config = load_config(cli.config).await?;

    match cli.command {
        Commands::Curve(args) => run_curve(&config, &args),
        Commands::Watch { ticks } => run_watch(&config, ticks).await,
    }
}
