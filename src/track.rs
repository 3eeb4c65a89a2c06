use serde::Serialize;

use crate::error::{Error, Result};

/// A single receiver fix in decimal degrees, altitude in meters.
///
/// Negative longitude is west, negative latitude is south.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
}

impl Sample {
    pub fn new(longitude: f64, latitude: f64, altitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            altitude,
        }
    }

    /// `(longitude, latitude)` pair, the form the distance function takes.
    pub fn lon_lat(&self) -> (f64, f64) {
        (self.longitude, self.latitude)
    }
}

impl From<(f64, f64, f64)> for Sample {
    fn from((longitude, latitude, altitude): (f64, f64, f64)) -> Self {
        Self::new(longitude, latitude, altitude)
    }
}

/// Ordered, read-only sequence of samples. Index order is recording order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    samples: Vec<Sample>,
}

impl Track {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// First and last sample, or `InsufficientSamples` when the track cannot
    /// describe a line.
    pub fn endpoints(&self) -> Result<(&Sample, &Sample)> {
        self.require(2)?;
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => Ok((first, last)),
            _ => Err(Error::InsufficientSamples {
                required: 2,
                actual: self.len(),
            }),
        }
    }

    pub(crate) fn require(&self, required: usize) -> Result<()> {
        if self.len() < required {
            return Err(Error::InsufficientSamples {
                required,
                actual: self.len(),
            });
        }
        Ok(())
    }

    /// Leading window of at most `size` samples, used as the stationary
    /// segment of the recording. Shorter tracks yield the whole track.
    pub fn stationary_window(&self, size: usize) -> Track {
        let end = size.min(self.samples.len());
        Track::new(self.samples[..end].to_vec())
    }
}

impl From<Vec<Sample>> for Track {
    fn from(samples: Vec<Sample>) -> Self {
        Self::new(samples)
    }
}

impl FromIterator<Sample> for Track {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Track {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
