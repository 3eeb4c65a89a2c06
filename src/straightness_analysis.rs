//! Straightness of the measured line.
//!
//! The measured track is compared against an ideal line walked from its first
//! sample in equal per-axis steps towards its last sample. Squared per-axis
//! deviations are averaged, converted from degrees with the equatorial
//! degree length, and combined into a single RMSE.
//!
//! The degree conversion ignores latitude: it is only meaningful for short
//! tracks, and longitude error is overstated by 1/cos(latitude) away from the
//! equator.

use std::fmt;

use log::debug;
use serde::Serialize;

use crate::error::Result;
use crate::geodesic::{deg_to_meter, validate_lon_lat};
use crate::track::{Sample, Track};

/// How the per-step increment of the ideal line is derived from the axis range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum IdealLineMode {
    /// `range / n`. The last ideal point stops one step short of the
    /// measured last sample.
    #[default]
    TrackLength,
    /// `range / (n - 1)`. The last ideal point lands on the measured last
    /// sample.
    ExactEndpoints,
}

impl IdealLineMode {
    pub fn step_divisor(&self, len: usize) -> f64 {
        match self {
            Self::TrackLength => len as f64,
            Self::ExactEndpoints => len.saturating_sub(1).max(1) as f64,
        }
    }
}

impl fmt::Display for IdealLineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrackLength => write!(f, "range / n"),
            Self::ExactEndpoints => write!(f, "range / (n - 1)"),
        }
    }
}

/// Whether an axis value grows or shrinks from the first to the last sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Upward,
    Downward,
}

impl Trend {
    fn of(first: f64, last: f64) -> Self {
        if first < last {
            Self::Upward
        } else {
            Self::Downward
        }
    }

    fn signed(&self, magnitude: f64) -> f64 {
        match self {
            Self::Upward => magnitude,
            Self::Downward => -magnitude,
        }
    }
}

/// Straight line of equal length to its source track.
#[derive(Debug, Clone, PartialEq)]
pub struct IdealLine {
    track: Track,
    pub mode: IdealLineMode,
    pub latitude_trend: Trend,
    pub longitude_trend: Trend,
    /// Signed per-step increments, degrees.
    pub latitude_step: f64,
    pub longitude_step: f64,
}

impl IdealLine {
    /// Builds the ideal line for `source`, which must hold at least two samples.
    pub fn fit(source: &Track, mode: IdealLineMode) -> Result<Self> {
        let (first, last) = source.endpoints()?;

        let latitude_trend = Trend::of(first.latitude, last.latitude);
        let longitude_trend = Trend::of(first.longitude, last.longitude);

        let latitude_range = (last.latitude - first.latitude).abs();
        let longitude_range = (last.longitude - first.longitude).abs();

        let divisor = mode.step_divisor(source.len());
        let latitude_step = latitude_trend.signed(latitude_range / divisor);
        let longitude_step = longitude_trend.signed(longitude_range / divisor);

        // Each point is the previous one plus a step; altitude is carried over
        // from the measured sample.
        let mut points = Vec::with_capacity(source.len());
        let mut current = *first;
        points.push(current);
        for sample in source.iter().skip(1) {
            current = Sample::new(
                current.longitude + longitude_step,
                current.latitude + latitude_step,
                sample.altitude,
            );
            points.push(current);
        }

        debug!(
            "ideal line: {} points, steps lat {:+.9} lon {:+.9} ({:?})",
            points.len(),
            latitude_step,
            longitude_step,
            mode
        );

        Ok(Self {
            track: Track::new(points),
            mode,
            latitude_trend,
            longitude_trend,
            latitude_step,
            longitude_step,
        })
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn len(&self) -> usize {
        self.track.len()
    }

    pub fn is_empty(&self) -> bool {
        self.track.is_empty()
    }

    pub fn points(&self) -> &[Sample] {
        self.track.samples()
    }
}

/// Squared ideal-minus-measured difference of one sample, square degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisDeviation {
    pub latitude_sq: f64,
    pub longitude_sq: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StraightnessResult {
    pub ideal_line: IdealLine,
    /// One entry per sample, same order as the track.
    pub deviations: Vec<AxisDeviation>,
    pub mse_latitude_m: f64,
    pub mse_longitude_m: f64,
    pub combined_mse_m: f64,
    pub rmse_m: f64,
}

/// RMSE of `track` against its `range / n` ideal line.
pub fn estimate_straightness(track: &Track) -> Result<StraightnessResult> {
    estimate_straightness_with(track, IdealLineMode::default())
}

pub fn estimate_straightness_with(track: &Track, mode: IdealLineMode) -> Result<StraightnessResult> {
    track.require(2)?;
    for sample in track {
        validate_lon_lat(sample.longitude, sample.latitude)?;
    }

    let ideal_line = IdealLine::fit(track, mode)?;

    let deviations: Vec<AxisDeviation> = ideal_line
        .points()
        .iter()
        .zip(track.iter())
        .map(|(ideal, measured)| AxisDeviation {
            latitude_sq: (ideal.latitude - measured.latitude).powi(2),
            longitude_sq: (ideal.longitude - measured.longitude).powi(2),
        })
        .collect();

    let n = deviations.len() as f64;
    let mse_latitude_deg = deviations.iter().map(|d| d.latitude_sq).sum::<f64>() / n;
    let mse_longitude_deg = deviations.iter().map(|d| d.longitude_sq).sum::<f64>() / n;

    // Single scalar factor per axis, applied after averaging.
    let factor = deg_to_meter();
    let mse_latitude_m = mse_latitude_deg * factor;
    let mse_longitude_m = mse_longitude_deg * factor;

    let combined_mse_m = (mse_latitude_m + mse_longitude_m) / 2.0;
    let rmse_m = combined_mse_m.sqrt();

    debug!(
        "straightness: mse lat {:.6} lon {:.6}, rmse {:.4}m",
        mse_latitude_m, mse_longitude_m, rmse_m
    );

    Ok(StraightnessResult {
        ideal_line,
        deviations,
        mse_latitude_m,
        mse_longitude_m,
        combined_mse_m,
        rmse_m,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn meridian_track() -> Track {
        vec![
            Sample::new(0.0, 0.0, 0.0),
            Sample::new(0.0, 1.0, 0.0),
            Sample::new(0.0, 2.0, 0.0),
        ]
        .into()
    }

    /// 11 samples on a diagonal, with `offset` degrees pushed perpendicular
    /// to the line on every interior sample.
    fn diagonal_track(offset: f64) -> Track {
        let n = 11;
        let perp = offset / std::f64::consts::SQRT_2;
        (0..n)
            .map(|i| {
                let t = i as f64 * 1e-4;
                if i == 0 || i == n - 1 {
                    Sample::new(10.0 + t, 20.0 + t, 5.0)
                } else {
                    Sample::new(10.0 + t - perp, 20.0 + t + perp, 5.0)
                }
            })
            .collect()
    }

    #[test]
    fn test_meridian_track_exact_endpoints() {
        let track = meridian_track();
        let result = estimate_straightness_with(&track, IdealLineMode::ExactEndpoints).unwrap();

        assert_eq!(result.ideal_line.track(), &track);
        assert_eq!(result.rmse_m, 0.0);
        assert!(result.deviations.iter().all(|d| d.latitude_sq == 0.0 && d.longitude_sq == 0.0));
    }

    #[test]
    fn test_meridian_track_keeps_step_artifact() {
        let track = meridian_track();
        let result = estimate_straightness(&track).unwrap();
        let ideal = result.ideal_line.points();

        assert_eq!(result.ideal_line.mode, IdealLineMode::TrackLength);
        assert_float_absolute_eq!(ideal[0].latitude, 0.0, 1e-12);
        assert_float_absolute_eq!(ideal[1].latitude, 2.0 / 3.0, 1e-12);
        assert_float_absolute_eq!(ideal[2].latitude, 4.0 / 3.0, 1e-12);
        assert!(ideal.iter().all(|p| p.longitude == 0.0));

        // lat deviations 0, 1/9, 4/9 -> mean 5/27 sq deg
        let expected_lat = 5.0 / 27.0 * deg_to_meter();
        assert_float_absolute_eq!(result.mse_latitude_m, expected_lat, 1e-6);
        assert_eq!(result.mse_longitude_m, 0.0);
        assert_float_absolute_eq!(result.rmse_m, (expected_lat / 2.0).sqrt(), 1e-6);
    }

    #[test]
    fn test_ideal_line_starts_at_first_sample() {
        let track = diagonal_track(3e-5);
        for mode in [IdealLineMode::TrackLength, IdealLineMode::ExactEndpoints] {
            let line = IdealLine::fit(&track, mode).unwrap();
            assert_eq!(line.len(), track.len());
            assert_eq!(line.points()[0], *track.first().unwrap());
        }
    }

    #[test]
    fn test_last_point_falls_short_by_one_step() {
        let track = diagonal_track(0.0);
        let line = IdealLine::fit(&track, IdealLineMode::TrackLength).unwrap();
        let last_ideal = line.points().last().unwrap();
        let last = track.last().unwrap();

        assert_float_absolute_eq!(last.latitude - last_ideal.latitude, line.latitude_step, 1e-12);
        assert_float_absolute_eq!(last.longitude - last_ideal.longitude, line.longitude_step, 1e-12);
    }

    #[test]
    fn test_linear_track_has_zero_rmse() {
        let track = diagonal_track(0.0);
        let result = estimate_straightness_with(&track, IdealLineMode::ExactEndpoints).unwrap();
        assert!(result.rmse_m < 1e-6, "rmse {}", result.rmse_m);
    }

    #[test]
    fn test_downward_trends() {
        let track: Track = vec![
            Sample::new(1.0, 1.0, 0.0),
            Sample::new(0.5, 0.5, 0.0),
            Sample::new(0.0, 0.0, 0.0),
        ]
        .into();
        let result = estimate_straightness_with(&track, IdealLineMode::ExactEndpoints).unwrap();
        let line = &result.ideal_line;

        assert_eq!(line.latitude_trend, Trend::Downward);
        assert_eq!(line.longitude_trend, Trend::Downward);
        assert!(line.latitude_step < 0.0);
        assert!(line.longitude_step < 0.0);
        assert!(result.rmse_m < 1e-6);
    }

    #[test]
    fn test_rmse_grows_with_offset() {
        for mode in [IdealLineMode::TrackLength, IdealLineMode::ExactEndpoints] {
            let rmse: Vec<f64> = [0.0, 1e-5, 2e-5, 5e-5, 1e-4]
                .iter()
                .map(|&offset| {
                    estimate_straightness_with(&diagonal_track(offset), mode)
                        .unwrap()
                        .rmse_m
                })
                .collect();
            for pair in rmse.windows(2) {
                assert!(pair[1] > pair[0], "{:?}: {:?}", mode, rmse);
            }
        }
    }

    #[test]
    fn test_deviations_cover_every_sample() {
        let track = diagonal_track(2e-5);
        let result = estimate_straightness(&track).unwrap();
        assert_eq!(result.deviations.len(), track.len());
        assert_float_absolute_eq!(
            result.combined_mse_m,
            (result.mse_latitude_m + result.mse_longitude_m) / 2.0,
            1e-12
        );
    }

    #[test]
    fn test_interior_fix_out_of_range() {
        let mut samples: Vec<Sample> = diagonal_track(0.0).iter().copied().collect();
        samples[7].latitude = 95.0;
        match estimate_straightness(&samples.into()) {
            Err(Error::InvalidCoordinate { latitude, .. }) => assert_eq!(latitude, 95.0),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_interior_fix_not_a_number() {
        let mut samples: Vec<Sample> = diagonal_track(0.0).iter().copied().collect();
        samples[4].longitude = f64::NAN;
        for mode in [IdealLineMode::TrackLength, IdealLineMode::ExactEndpoints] {
            assert!(matches!(
                estimate_straightness_with(&samples.clone().into(), mode),
                Err(Error::InvalidCoordinate { .. })
            ));
        }
    }

    #[test]
    fn test_single_sample_is_insufficient() {
        let track: Track = vec![Sample::new(0.0, 0.0, 0.0)].into();
        assert!(matches!(
            estimate_straightness(&track),
            Err(Error::InsufficientSamples { required: 2, actual: 1 })
        ));
    }
}
