//! Geodesic distance on the WGS-84 ellipsoid, plus the earth-size constant the
//! straightness analysis converts degrees with.
//!
//! `geo`'s geodesic implementation (Karney) is WGS-84, so the radius below is
//! the same ellipsoid's semi-major axis. Keep them in step.

use std::f64::consts::PI;

use geo::{point, GeodesicDistance};

use crate::error::{Error, Result};

/// WGS-84 equatorial radius (semi-major axis), meters.
pub const WGS84_EQUATORIAL_RADIUS_M: f64 = 6_378_137.0;

/// Equatorial circumference, meters.
pub const EARTH_CIRCUMFERENCE_M: f64 = 2.0 * PI * WGS84_EQUATORIAL_RADIUS_M;

/// Meters per degree of arc along the equator (~111,319.49 m).
///
/// Only a fair approximation near the equator and over small extents: one
/// degree of longitude shrinks with cos(latitude) and one degree of latitude
/// varies between ~110.57 km and ~111.69 km on the ellipsoid.
pub fn deg_to_meter() -> f64 {
    EARTH_CIRCUMFERENCE_M / 360.0
}

/// Rejects anything outside [-180, 180] longitude / [-90, 90] latitude,
/// and non-finite values.
pub fn validate_lon_lat(longitude: f64, latitude: f64) -> Result<()> {
    let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
    let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
    if lon_ok && lat_ok {
        Ok(())
    } else {
        Err(Error::InvalidCoordinate {
            longitude,
            latitude,
        })
    }
}

/// Ellipsoidal surface distance in meters between two `(longitude, latitude)`
/// points.
pub fn distance(a: (f64, f64), b: (f64, f64)) -> Result<f64> {
    validate_lon_lat(a.0, a.1)?;
    validate_lon_lat(b.0, b.1)?;

    if a == b {
        return Ok(0.0);
    }

    let pa = point!(x: a.0, y: a.1);
    let pb = point!(x: b.0, y: b.1);
    Ok(pa.geodesic_distance(&pb).abs())
}
