use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::error;

use gnss_evaluator::analysis::{analyze_file, analyze_folder, FileAnalysis};
use gnss_evaluator::config::AnalysisConfig;
use gnss_evaluator::report::{
    export_analysis, render_batch_summary, render_report, write_batch_summary_csv,
};
use gnss_evaluator::{Error, Result};

#[derive(Parser, Debug)]
#[command(about = "Precision, accuracy and straightness of a GNSS receiver from a recorded test walk")]
struct Args {
    /// Recording to analyse (.kml, .gpx or .csv)
    #[arg(required_unless_present = "batch", conflicts_with = "batch")]
    track: Option<PathBuf>,

    /// Analyse every recording under this folder instead
    #[arg(long)]
    batch: Option<PathBuf>,

    /// JSON run settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minutes the receiver was held still before walking (>= 2)
    #[arg(long)]
    dwell_minutes: Option<u32>,

    /// Surveyed length of the walked line, meters
    #[arg(long)]
    target_length_m: Option<f64>,

    /// Warm-up seconds dropped from the start of the recording
    #[arg(long)]
    trim_seconds: Option<f64>,

    /// Fix spacing used to trim recordings without timestamps
    #[arg(long)]
    sample_interval_s: Option<f64>,

    /// Fixes in the stationary precision window
    #[arg(long)]
    window_size: Option<usize>,

    /// Step the ideal line so it ends on the last fix
    #[arg(long)]
    exact_endpoints: bool,

    /// Write plot data and metric CSVs here
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl Args {
    fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut cfg = match &self.config {
            Some(path) => AnalysisConfig::load(path)?,
            None => AnalysisConfig::default(),
        };

        if let Some(v) = self.dwell_minutes {
            cfg.dwell_minutes = v;
        }
        if let Some(v) = self.target_length_m {
            cfg.target_length_m = Some(v);
        }
        if let Some(v) = self.trim_seconds {
            cfg.trim_seconds = v;
        }
        if let Some(v) = self.sample_interval_s {
            cfg.sample_interval_s = v;
        }
        if let Some(v) = self.window_size {
            cfg.window_size_samples = v;
        }
        if self.exact_endpoints {
            cfg.exact_endpoints = true;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

fn run_single(path: &Path, cfg: &AnalysisConfig, output_dir: Option<&Path>) -> Result<()> {
    let result = analyze_file(path, cfg)?;
    let name = result.file_name();

    println!("{}", render_report(&name, &result.analysis));

    if let Some(dir) = output_dir {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("track");
        for written in export_analysis(dir, stem, &result.analysis)? {
            println!("📁 {}", written.display());
        }
    }
    Ok(())
}

fn run_batch(folder: &Path, cfg: &AnalysisConfig, output_dir: Option<&Path>) -> Result<()> {
    let start_time = std::time::Instant::now();
    let results = analyze_folder(folder, cfg);

    if results.is_empty() {
        return Err(Error::MalformedInput(format!(
            "no track files found under {}",
            folder.display()
        )));
    }

    let succeeded: Vec<&FileAnalysis> = results.iter().filter_map(|(_, r)| r.as_ref().ok()).collect();
    let failed = results.len() - succeeded.len();

    for result in &succeeded {
        println!("{}", render_report(&result.file_name(), &result.analysis));
    }
    println!("{}", render_batch_summary(&succeeded, failed));
    println!("⏱️  {:.2}s", start_time.elapsed().as_secs_f64());

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)?;
        for result in &succeeded {
            let stem = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("track");
            export_analysis(dir, stem, &result.analysis)?;
        }
        let csv_path = dir.join("batch_summary.csv");
        write_batch_summary_csv(&succeeded, &csv_path)?;
        println!("📄 Summary CSV saved to: {}", csv_path.display());
    }

    if succeeded.is_empty() {
        return Err(Error::MalformedInput(format!(
            "all {} track files failed",
            failed
        )));
    }
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let cfg = args.analysis_config()?;
    let output_dir = args.output_dir.as_deref();

    match (&args.batch, &args.track) {
        (Some(folder), _) => run_batch(folder, &cfg, output_dir),
        (None, Some(path)) => run_single(path, &cfg, output_dir),
        (None, None) => Err(Error::InvalidConfig("no track file given".to_string())),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
