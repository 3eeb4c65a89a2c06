//! Positional performance of a GNSS receiver from a logged test walk:
//! stationary precision, line-length accuracy and line straightness.

#[cfg(test)]
#[macro_use]
extern crate assert_float_eq;

pub mod accuracy_analysis;
pub mod analysis;
pub mod config;
pub mod error;
pub mod geodesic;
pub mod precision_analysis;
pub mod report;
pub mod straightness_analysis;
pub mod track;
pub mod track_reader;

pub use accuracy_analysis::{estimate_accuracy, AccuracyResult};
pub use analysis::{analyze_file, analyze_folder, analyze_track, FileAnalysis, MetricResult, TrackAnalysis};
pub use config::AnalysisConfig;
pub use error::{Error, Result};
pub use geodesic::{distance, WGS84_EQUATORIAL_RADIUS_M};
pub use precision_analysis::{estimate_precision, PrecisionBound, PRECISION_WINDOW_SAMPLES};
pub use straightness_analysis::{
    estimate_straightness, estimate_straightness_with, IdealLine, IdealLineMode, StraightnessResult,
};
pub use track::{Sample, Track};
