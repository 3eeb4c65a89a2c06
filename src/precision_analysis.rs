//! Precision of stationary fixes.
//!
//! While the receiver sits still every fix should land on the same spot; the
//! spread of all pairwise distances inside the stationary window, halved, is
//! reported as a +/- bound.

use log::debug;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::geodesic::distance;
use crate::track::Track;

/// Samples in the stationary window (one minute at 1 Hz).
pub const PRECISION_WINDOW_SAMPLES: usize = 60;

/// Upper bound accepted for a configured window; the pair count grows as n².
pub const MAX_PRECISION_WINDOW_SAMPLES: usize = 2000;

/// Distance between two samples of the window, by index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairwiseDistance {
    pub a: usize,
    pub b: usize,
    pub meters: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrecisionBound {
    /// Samples in the window the bound was computed over.
    pub window_len: usize,
    /// Ordered pairs measured, `n * (n - 1)`.
    pub pair_count: usize,
    pub min_distance_m: f64,
    pub max_distance_m: f64,
    /// `(max - min) / 2`, read as +/- meters.
    pub bound_m: f64,
}

/// Distances for every ordered pair `(i, j)`, `i != j`, in index order.
pub fn pairwise_distances(window: &Track) -> Result<Vec<PairwiseDistance>> {
    let samples = window.samples();
    let n = samples.len();
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1));

    for (a, first) in samples.iter().enumerate() {
        for (b, second) in samples.iter().enumerate() {
            if a == b {
                continue;
            }
            pairs.push(PairwiseDistance {
                a,
                b,
                meters: distance(first.lon_lat(), second.lon_lat())?,
            });
        }
    }

    Ok(pairs)
}

/// Half-range of the pairwise distances inside `window`.
///
/// `window` is expected to be the stationary prefix of the trimmed track,
/// see [`Track::stationary_window`].
pub fn estimate_precision(window: &Track) -> Result<PrecisionBound> {
    window.require(2)?;

    let pairs = pairwise_distances(window)?;

    // Running extremes are seeded from the first pair, never from zero.
    let mut iter = pairs.iter();
    let first = iter.next().ok_or(Error::InsufficientSamples {
        required: 2,
        actual: window.len(),
    })?;
    let (mut minimum, mut maximum) = (first.meters, first.meters);
    for pair in iter {
        minimum = minimum.min(pair.meters);
        maximum = maximum.max(pair.meters);
    }

    let bound_m = (maximum - minimum) / 2.0;
    debug!(
        "precision: {} samples, {} pairs, min {:.3}m, max {:.3}m",
        window.len(),
        pairs.len(),
        minimum,
        maximum
    );

    Ok(PrecisionBound {
        window_len: window.len(),
        pair_count: pairs.len(),
        min_distance_m: minimum,
        max_distance_m: maximum,
        bound_m,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesic::deg_to_meter;
    use crate::track::Sample;

    #[test]
    fn test_identical_samples_have_zero_bound() {
        let window: Track = vec![Sample::new(1.0, 2.0, 10.0); 3].into();
        let bound = estimate_precision(&window).unwrap();

        assert_eq!(bound.pair_count, 6);
        assert_eq!(bound.min_distance_m, 0.0);
        assert_eq!(bound.max_distance_m, 0.0);
        assert_eq!(bound.bound_m, 0.0);
    }

    #[test]
    fn test_pair_count_is_ordered_pairs() {
        let window: Track = (0..PRECISION_WINDOW_SAMPLES)
            .map(|i| Sample::new(0.0, i as f64 * 1e-6, 0.0))
            .collect();
        let pairs = pairwise_distances(&window).unwrap();
        assert_eq!(pairs.len(), 3540);
        assert!(pairs.iter().all(|p| p.a != p.b));
    }

    #[test]
    fn test_minimum_is_not_stuck_at_zero() {
        // Three collinear fixes 1e-5 deg apart: min pair ~1.1 m, max ~2.2 m.
        let step = 1e-5;
        let window: Track = (0..3)
            .map(|i| Sample::new(i as f64 * step, 0.0, 0.0))
            .collect();
        let bound = estimate_precision(&window).unwrap();

        let unit = step * deg_to_meter();
        assert_float_absolute_eq!(bound.min_distance_m, unit, 1e-3);
        assert_float_absolute_eq!(bound.max_distance_m, 2.0 * unit, 1e-3);
        assert_float_absolute_eq!(bound.bound_m, unit / 2.0, 1e-3);
    }

    #[test]
    fn test_two_samples_have_zero_spread() {
        // a single distinct distance, measured both ways
        let window: Track = vec![Sample::new(0.0, 0.0, 0.0), Sample::new(0.001, 0.0, 0.0)].into();
        let bound = estimate_precision(&window).unwrap();
        assert_eq!(bound.pair_count, 2);
        assert_eq!(bound.bound_m, 0.0);
        assert!(bound.min_distance_m > 0.0);
    }

    #[test]
    fn test_bound_is_never_negative() {
        let window: Track = [
            (-0.1276, 51.5072),
            (-0.12761, 51.50721),
            (-0.12758, 51.50719),
            (-0.12762, 51.50723),
            (-0.12759, 51.5072),
        ]
        .iter()
        .map(|&(lon, lat)| Sample::new(lon, lat, 35.0))
        .collect();
        let bound = estimate_precision(&window).unwrap();
        assert!(bound.bound_m >= 0.0);
        assert!(bound.max_distance_m >= bound.min_distance_m);
    }

    #[test]
    fn test_single_sample_is_insufficient() {
        let window: Track = vec![Sample::new(1.0, 2.0, 10.0)].into();
        assert!(matches!(
            estimate_precision(&window),
            Err(Error::InsufficientSamples { required: 2, actual: 1 })
        ));
        assert!(matches!(
            estimate_precision(&Track::default()),
            Err(Error::InsufficientSamples { actual: 0, .. })
        ));
    }

    #[test]
    fn test_invalid_sample_propagates() {
        let window: Track = vec![Sample::new(0.0, 0.0, 0.0), Sample::new(0.0, 95.0, 0.0)].into();
        assert!(matches!(
            estimate_precision(&window),
            Err(Error::InvalidCoordinate { .. })
        ));
    }
}
