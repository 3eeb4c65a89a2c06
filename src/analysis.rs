//! Runs the three estimators over a track, and over folders of recordings.

use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::accuracy_analysis::{estimate_accuracy, AccuracyResult};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::precision_analysis::{estimate_precision, PrecisionBound};
use crate::straightness_analysis::{estimate_straightness_with, StraightnessResult};
use crate::track::Track;
use crate::track_reader::{read_track, TrackFormat};

/// One metric of a finished run, as handed to reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricResult<'a> {
    Precision(&'a PrecisionBound),
    Accuracy(&'a AccuracyResult),
    Straightness(&'a StraightnessResult),
}

/// Every metric for one trimmed track, plus what reporting needs to plot.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackAnalysis {
    pub track: Track,
    /// Stationary prefix the precision bound was computed over.
    pub window: Track,
    pub precision: PrecisionBound,
    pub accuracy: AccuracyResult,
    pub straightness: StraightnessResult,
}

impl TrackAnalysis {
    pub fn metrics(&self) -> [MetricResult<'_>; 3] {
        [
            MetricResult::Precision(&self.precision),
            MetricResult::Accuracy(&self.accuracy),
            MetricResult::Straightness(&self.straightness),
        ]
    }
}

/// Runs precision, accuracy and straightness over `track`.
///
/// The estimators share nothing but the read-only track, so they run side by
/// side. Any failure fails the whole run.
pub fn analyze_track(track: Track, config: &AnalysisConfig) -> Result<TrackAnalysis> {
    let target_length_m = config.target_length()?;
    let mode = config.ideal_line_mode();

    let window = track.stationary_window(config.window_size_samples);
    if window.len() < config.window_size_samples {
        warn!(
            "track holds {} fixes, precision window of {} truncated",
            track.len(),
            config.window_size_samples
        );
    }
    let dwell_seconds = config.dwell_minutes as f64 * 60.0;
    if config.trim_seconds + config.window_seconds() > dwell_seconds {
        warn!(
            "warm-up trim plus precision window ({}s) runs past the {} minute dwell",
            config.trim_seconds + config.window_seconds(),
            config.dwell_minutes
        );
    }

    let (precision, (accuracy, straightness)) = rayon::join(
        || estimate_precision(&window),
        || {
            rayon::join(
                || estimate_accuracy(&track, target_length_m),
                || estimate_straightness_with(&track, mode),
            )
        },
    );

    Ok(TrackAnalysis {
        precision: precision?,
        accuracy: accuracy?,
        straightness: straightness?,
        window,
        track,
    })
}

/// Result of analysing one recording on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAnalysis {
    pub path: PathBuf,
    /// Fixes read before the warm-up trim.
    pub raw_fixes: usize,
    pub analysis: TrackAnalysis,
}

impl FileAnalysis {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown")
            .to_string()
    }
}

/// Read, trim and analyse a single recording.
pub fn analyze_file(path: &Path, config: &AnalysisConfig) -> Result<FileAnalysis> {
    let raw = read_track(path)?;
    let track = raw.trim_warm_up(config.trim_seconds, config.sample_interval_s)?;
    let analysis = analyze_track(track, config)?;

    Ok(FileAnalysis {
        path: path.to_path_buf(),
        raw_fixes: raw.len(),
        analysis,
    })
}

/// Every recording under `folder` with a readable extension, sorted by path.
pub fn find_track_files(folder: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file() && TrackFormat::from_path(entry.path()).is_some()
        })
        .map(|entry| entry.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Analyses every recording under `folder` in parallel.
///
/// Results come back in path order, failures included; a failed file never
/// contributes numbers.
pub fn analyze_folder(
    folder: &Path,
    config: &AnalysisConfig,
) -> Vec<(PathBuf, Result<FileAnalysis>)> {
    let files = find_track_files(folder);
    info!(
        "found {} track files under {}, using {} cores",
        files.len(),
        folder.display(),
        num_cpus::get()
    );

    files
        .par_iter()
        .map(|path| {
            let result = analyze_file(path, config);
            if let Err(e) = &result {
                warn!("{}: {}", path.display(), e);
            }
            (path.clone(), result)
        })
        .collect()
}
