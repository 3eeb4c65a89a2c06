//! Console report and CSV exports.
//!
//! Nothing here computes a metric. The measured-vs-ideal and stationary
//! window files carry everything a plotting tool needs.

use std::fmt::Write as _;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use csv::Writer;
use log::info;
use serde::Serialize;

use crate::analysis::{FileAnalysis, MetricResult, TrackAnalysis};
use crate::error::Result;
use crate::track::Track;

fn banner(out: &mut String, title: &str) {
    let stars = "*".repeat(title.len());
    let _ = writeln!(out, "{}", stars);
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", stars);
}

/// Human readable report for one analysed track.
pub fn render_report(name: &str, analysis: &TrackAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "GNSS track analysis: {}", name);
    let _ = writeln!(out, "{} fixes after warm-up trim", analysis.track.len());
    let _ = writeln!(out);

    for metric in analysis.metrics() {
        match metric {
            MetricResult::Precision(p) => {
                banner(&mut out, "PRECISION");
                let _ = writeln!(
                    out,
                    "Stationary window: {} fixes, {} pairs",
                    p.window_len, p.pair_count
                );
                let _ = writeln!(
                    out,
                    "Pairwise distance: min {:.3}m, max {:.3}m",
                    p.min_distance_m, p.max_distance_m
                );
                let _ = writeln!(out, "Max delta = +/- {:.3}m", p.bound_m);
            }
            MetricResult::Accuracy(a) => {
                banner(&mut out, "ACCURACY");
                let _ = writeln!(out, "Target line length was {:.3}m", a.target_m);
                let _ = writeln!(out, "Measured line length = {:.3}m", a.measured_m);
                let _ = writeln!(out, "Line length delta = {:.3}m", a.delta_m);
            }
            MetricResult::Straightness(s) => {
                banner(&mut out, "STRAIGHTNESS");
                let _ = writeln!(out, "Ideal line step: {}", s.ideal_line.mode);
                let _ = writeln!(out, "Root Mean Squared Error = {:.3}m", s.rmse_m);
            }
        }
        let _ = writeln!(out);
    }

    out
}

#[derive(Debug, Serialize)]
struct WindowRow {
    index: usize,
    longitude: f64,
    latitude: f64,
    altitude: f64,
}

#[derive(Debug, Serialize)]
struct LineRow {
    index: usize,
    measured_longitude: f64,
    measured_latitude: f64,
    ideal_longitude: f64,
    ideal_latitude: f64,
    latitude_sq_deviation_deg2: f64,
    longitude_sq_deviation_deg2: f64,
}

#[derive(Debug, Serialize, Clone)]
struct MetricsRow {
    filename: String,
    fixes: usize,
    window_fixes: usize,
    precision_bound_m: f64,
    min_pair_distance_m: f64,
    max_pair_distance_m: f64,
    target_length_m: f64,
    measured_length_m: f64,
    length_delta_m: f64,
    straightness_rmse_m: f64,
}

impl MetricsRow {
    fn new(filename: &str, analysis: &TrackAnalysis) -> Self {
        Self {
            filename: filename.to_string(),
            fixes: analysis.track.len(),
            window_fixes: analysis.window.len(),
            precision_bound_m: analysis.precision.bound_m,
            min_pair_distance_m: analysis.precision.min_distance_m,
            max_pair_distance_m: analysis.precision.max_distance_m,
            target_length_m: analysis.accuracy.target_m,
            measured_length_m: analysis.accuracy.measured_m,
            length_delta_m: analysis.accuracy.delta_m,
            straightness_rmse_m: analysis.straightness.rmse_m,
        }
    }
}

/// Stationary fixes, for the scatter plot of the dwell period.
pub fn write_stationary_window_csv(window: &Track, output_path: &Path) -> Result<()> {
    let mut wtr = Writer::from_path(output_path)?;
    for (index, s) in window.iter().enumerate() {
        wtr.serialize(WindowRow {
            index,
            longitude: s.longitude,
            latitude: s.latitude,
            altitude: s.altitude,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Measured fixes next to their ideal-line counterparts.
pub fn write_measured_vs_ideal_csv(analysis: &TrackAnalysis, output_path: &Path) -> Result<()> {
    let mut wtr = Writer::from_path(output_path)?;
    let ideal = analysis.straightness.ideal_line.points();

    for (index, ((measured, ideal), deviation)) in analysis
        .track
        .iter()
        .zip(ideal.iter())
        .zip(analysis.straightness.deviations.iter())
        .enumerate()
    {
        wtr.serialize(LineRow {
            index,
            measured_longitude: measured.longitude,
            measured_latitude: measured.latitude,
            ideal_longitude: ideal.longitude,
            ideal_latitude: ideal.latitude,
            latitude_sq_deviation_deg2: deviation.latitude_sq,
            longitude_sq_deviation_deg2: deviation.longitude_sq,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_metrics_csv(name: &str, analysis: &TrackAnalysis, output_path: &Path) -> Result<()> {
    let mut wtr = Writer::from_path(output_path)?;
    wtr.serialize(MetricsRow::new(name, analysis))?;
    wtr.flush()?;
    Ok(())
}

/// Writes the three per-track files into `output_dir`, named after `stem`.
pub fn export_analysis(output_dir: &Path, stem: &str, analysis: &TrackAnalysis) -> Result<Vec<PathBuf>> {
    create_dir_all(output_dir)?;

    let window_path = output_dir.join(format!("{}_stationary_window.csv", stem));
    let line_path = output_dir.join(format!("{}_measured_vs_ideal.csv", stem));
    let metrics_path = output_dir.join(format!("{}_metrics.csv", stem));

    write_stationary_window_csv(&analysis.window, &window_path)?;
    write_measured_vs_ideal_csv(analysis, &line_path)?;
    write_metrics_csv(stem, analysis, &metrics_path)?;

    info!("wrote plot data for {} to {}", stem, output_dir.display());
    Ok(vec![window_path, line_path, metrics_path])
}

/// One row per successfully analysed file.
pub fn write_batch_summary_csv(results: &[&FileAnalysis], output_path: &Path) -> Result<()> {
    let mut wtr = Writer::from_path(output_path)?;
    for result in results {
        wtr.serialize(MetricsRow::new(&result.file_name(), &result.analysis))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn render_batch_summary(results: &[&FileAnalysis], failed: usize) -> String {
    let mut out = String::new();
    banner(&mut out, "BATCH SUMMARY");
    let _ = writeln!(
        out,
        "{:<40} {:>8} {:>12} {:>12} {:>12}",
        "File", "Fixes", "Precision", "Delta", "RMSE"
    );
    for result in results {
        let a = &result.analysis;
        let _ = writeln!(
            out,
            "{:<40} {:>8} {:>11.3}m {:>11.3}m {:>11.3}m",
            result.file_name(),
            a.track.len(),
            a.precision.bound_m,
            a.accuracy.delta_m,
            a.straightness.rmse_m
        );
    }

    if !results.is_empty() {
        let n = results.len() as f64;
        let mean_precision = results.iter().map(|r| r.analysis.precision.bound_m).sum::<f64>() / n;
        let mean_abs_delta = results.iter().map(|r| r.analysis.accuracy.delta_m.abs()).sum::<f64>() / n;
        let mean_rmse = results.iter().map(|r| r.analysis.straightness.rmse_m).sum::<f64>() / n;
        let _ = writeln!(out);
        let _ = writeln!(out, "Mean precision bound: +/- {:.3}m", mean_precision);
        let _ = writeln!(out, "Mean |length delta|: {:.3}m", mean_abs_delta);
        let _ = writeln!(out, "Mean straightness RMSE: {:.3}m", mean_rmse);
    }
    let _ = writeln!(out, "Analysed {} files, {} failed", results.len(), failed);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_track;
    use crate::config::AnalysisConfig;
    use crate::track::Sample;
    use tempdir::TempDir;

    fn analysis() -> TrackAnalysis {
        let mut samples = vec![Sample::new(0.5, 0.5, 12.0); 4];
        samples.extend((1..=10).map(|i| Sample::new(0.5, 0.5 + i as f64 * 1e-4, 12.0)));
        let cfg = AnalysisConfig {
            target_length_m: Some(110.0),
            window_size_samples: 4,
            ..Default::default()
        };
        analyze_track(samples.into(), &cfg).unwrap()
    }

    #[test]
    fn test_report_sections() {
        let report = render_report("walk.kml", &analysis());
        assert!(report.contains("GNSS track analysis: walk.kml"));
        for section in ["PRECISION", "ACCURACY", "STRAIGHTNESS"] {
            assert!(report.contains(section), "missing {}", section);
        }
        assert!(report.contains("Max delta = +/- 0.000m"));
        assert!(report.contains("Target line length was 110.000m"));
        assert!(report.contains("Root Mean Squared Error = "));
        assert!(report.contains("Ideal line step: range / n\n"));
    }

    #[test]
    fn test_report_names_exact_endpoint_step() {
        let mut samples = vec![Sample::new(0.5, 0.5, 12.0); 4];
        samples.extend((1..=10).map(|i| Sample::new(0.5, 0.5 + i as f64 * 1e-4, 12.0)));
        let cfg = AnalysisConfig {
            target_length_m: Some(110.0),
            window_size_samples: 4,
            exact_endpoints: true,
            ..Default::default()
        };
        let report = render_report("walk.kml", &analyze_track(samples.into(), &cfg).unwrap());
        assert!(report.contains("Ideal line step: range / (n - 1)"));
        assert!(!report.contains("ExactEndpoints"));
    }

    #[test]
    fn test_export_writes_plot_files() {
        let dir = TempDir::new("report-export_writes_plot_files").unwrap();
        let analysis = analysis();
        let paths = export_analysis(dir.path(), "walk", &analysis).unwrap();
        assert_eq!(paths.len(), 3);

        let mut rdr = csv::Reader::from_path(&paths[0]).unwrap();
        assert_eq!(rdr.records().count(), analysis.window.len());

        let mut rdr = csv::Reader::from_path(&paths[1]).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(&headers[3], "ideal_longitude");
        assert_eq!(rdr.records().count(), analysis.track.len());

        let mut rdr = csv::Reader::from_path(&paths[2]).unwrap();
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "walk");
    }

    #[test]
    fn test_batch_summary_counts() {
        let file = FileAnalysis {
            path: PathBuf::from("logs/walk.kml"),
            raw_fixes: 44,
            analysis: analysis(),
        };
        let summary = render_batch_summary(&[&file], 2);
        assert!(summary.contains("walk.kml"));
        assert!(summary.contains("Analysed 1 files, 2 failed"));

        let empty = render_batch_summary(&[], 1);
        assert!(!empty.contains("Mean precision"));
    }
}
