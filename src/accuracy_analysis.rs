//! Accuracy against a surveyed line length.

use log::debug;
use serde::Serialize;

use crate::error::Result;
use crate::geodesic::distance;
use crate::track::Track;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyResult {
    pub target_m: f64,
    pub measured_m: f64,
    /// `target - measured`; positive when the measured line came up short.
    pub delta_m: f64,
}

/// Compares the first-to-last distance of `track` with `target_length_m`.
pub fn estimate_accuracy(track: &Track, target_length_m: f64) -> Result<AccuracyResult> {
    let (first, last) = track.endpoints()?;
    let measured_m = distance(first.lon_lat(), last.lon_lat())?;
    let delta_m = target_length_m - measured_m;

    debug!(
        "accuracy: target {:.3}m, measured {:.3}m over {} samples",
        target_length_m,
        measured_m,
        track.len()
    );

    Ok(AccuracyResult {
        target_m: target_length_m,
        measured_m,
        delta_m,
    })
}
