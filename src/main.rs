//! autophase: automatic zero/first-order phase correction of 1D spectra.

use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use nmr_autophase::data::spectrum::Spectrum;
use nmr_autophase::log::reproducibility::ReproLog;
use nmr_autophase::pipeline::autophase::{AutoPhaseOptions, AutoPhaseResult, DEFAULT_MAX_CLIP_ITERATIONS};
use nmr_autophase::pipeline::processing;
use nmr_autophase::stats::{noise_level, NoiseOptions};

#[derive(Parser)]
#[command(
    name = "autophase",
    version,
    about = "Automatic phase correction of 1D NMR spectra"
)]
struct Cli {
    /// Input JSON spectrum ({"real": [...], "imag": [...]}, or - for stdin)
    #[arg(short, long)]
    r#in: String,

    /// Output JSON result (or - for stdout)
    #[arg(short, long, default_value = "-")]
    out: String,

    /// Minimum region length in points; shorter noise gaps are merged
    #[arg(short = 'k', long)]
    min_reg_size: usize,

    /// Safety cap on sigma-clipping passes
    #[arg(long, default_value_t = DEFAULT_MAX_CLIP_ITERATIONS)]
    max_clip_iterations: usize,

    /// Input is a time-domain FID; Fourier transform it first
    #[arg(long, default_value_t = false)]
    time_domain: bool,

    /// Report the SAN-plot noise level of the corrected real channel
    #[arg(long, default_value_t = false)]
    noise: bool,

    /// Save the reproducibility log as text
    #[arg(long)]
    log_text: Option<PathBuf>,

    /// Save the reproducibility log as JSON
    #[arg(long)]
    log_json: Option<PathBuf>,

    /// Save the reproducibility log as an NMRPipe shell script
    #[arg(long)]
    log_script: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    ::log::info!("autophase v{}", env!("CARGO_PKG_VERSION"));

    let mut spectrum = read_spectrum(&cli.r#in)?;
    let mut log = ReproLog::new();
    log.set_source(&cli.r#in);

    if cli.time_domain {
        spectrum = processing::fourier_transform(&spectrum, true, &mut log);
    }

    let options = AutoPhaseOptions::new(cli.min_reg_size)
        .with_max_clip_iterations(cli.max_clip_iterations);
    let result = processing::auto_phase(&spectrum, &options, &mut log)?;

    if !result.warnings.is_empty() {
        ::log::info!("{} warning(s) recorded in the result", result.warnings.len());
    }

    if cli.noise {
        let level = noise_level(&result.data.real, &NoiseOptions::default())?;
        ::log::info!(
            "Noise level: +{:.4e} / -{:.4e}, SNR {:.1}",
            level.positive,
            level.negative,
            level.snr
        );
    }

    write_result(&cli.out, &result)?;

    if let Some(path) = &cli.log_text {
        log.save_text(path)?;
    }
    if let Some(path) = &cli.log_json {
        log.save_json(path)?;
    }
    if let Some(path) = &cli.log_script {
        log.save_script(path)?;
    }

    Ok(())
}

fn read_spectrum(in_path: &str) -> Result<Spectrum, Box<dyn std::error::Error>> {
    let spectrum: Spectrum = if in_path == "-" {
        serde_json::from_reader(BufReader::new(io::stdin().lock()))?
    } else {
        serde_json::from_reader(BufReader::new(File::open(in_path)?))?
    };
    ::log::info!("Read {} points from {}", spectrum.len(), in_path);
    Ok(spectrum)
}

fn write_result(out_path: &str, result: &AutoPhaseResult) -> Result<(), Box<dyn std::error::Error>> {
    if out_path == "-" {
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        serde_json::to_writer_pretty(&mut out, result)?;
        writeln!(out)?;
        out.flush()?;
    } else {
        let mut out = BufWriter::new(File::create(out_path)?);
        serde_json::to_writer_pretty(&mut out, result)?;
        out.flush()?;
    }
    Ok(())
}
