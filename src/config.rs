use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::precision_analysis::{MAX_PRECISION_WINDOW_SAMPLES, PRECISION_WINDOW_SAMPLES};
use crate::straightness_analysis::IdealLineMode;

/// Shortest stationary dwell the test procedure accepts.
pub const MIN_DWELL_MINUTES: u32 = 2;

/// uBlox receivers take about this long to settle after power-up.
pub const DEFAULT_TRIM_SECONDS: f64 = 30.0;

pub const DEFAULT_SAMPLE_INTERVAL_S: f64 = 1.0;

/// Settings for one analysis run.
///
/// The estimators trust these values; everything is checked once, here,
/// by [`AnalysisConfig::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    /// How long the receiver was held still before walking the line.
    pub dwell_minutes: u32,
    /// Surveyed length of the walked line. Required.
    pub target_length_m: Option<f64>,
    pub trim_seconds: f64,
    /// Fallback spacing between fixes when the recording has no timestamps.
    pub sample_interval_s: f64,
    pub window_size_samples: usize,
    /// Step the ideal line by `range / (n - 1)` instead of `range / n`.
    pub exact_endpoints: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dwell_minutes: MIN_DWELL_MINUTES,
            target_length_m: None,
            trim_seconds: DEFAULT_TRIM_SECONDS,
            sample_interval_s: DEFAULT_SAMPLE_INTERVAL_S,
            window_size_samples: PRECISION_WINDOW_SAMPLES,
            exact_endpoints: false,
        }
    }
}

impl AnalysisConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        let cfg = serde_json::from_slice(&data)?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dwell_minutes < MIN_DWELL_MINUTES {
            return Err(Error::InvalidConfig(format!(
                "dwell time cannot be less than {} minutes (got {})",
                MIN_DWELL_MINUTES, self.dwell_minutes
            )));
        }

        match self.target_length_m {
            None => {
                return Err(Error::InvalidConfig(
                    "target line length is required".to_string(),
                ))
            }
            Some(length) if !(length.is_finite() && length > 0.0) => {
                return Err(Error::InvalidConfig(format!(
                    "target line length must be a positive number of meters (got {})",
                    length
                )))
            }
            Some(_) => {}
        }

        if !(self.trim_seconds.is_finite() && self.trim_seconds >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "trim seconds must be >= 0 (got {})",
                self.trim_seconds
            )));
        }

        if !(self.sample_interval_s.is_finite() && self.sample_interval_s > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "sample interval must be > 0 (got {})",
                self.sample_interval_s
            )));
        }

        if !(2..=MAX_PRECISION_WINDOW_SAMPLES).contains(&self.window_size_samples) {
            return Err(Error::InvalidConfig(format!(
                "precision window must hold 2..={} samples (got {})",
                MAX_PRECISION_WINDOW_SAMPLES, self.window_size_samples
            )));
        }

        Ok(())
    }

    /// Target length, once validated.
    pub fn target_length(&self) -> Result<f64> {
        self.target_length_m
            .ok_or_else(|| Error::InvalidConfig("target line length is required".to_string()))
    }

    pub fn ideal_line_mode(&self) -> IdealLineMode {
        if self.exact_endpoints {
            IdealLineMode::ExactEndpoints
        } else {
            IdealLineMode::TrackLength
        }
    }

    /// Stationary window duration implied by the window size, seconds.
    pub fn window_seconds(&self) -> f64 {
        self.window_size_samples as f64 * self.sample_interval_s
    }
}
