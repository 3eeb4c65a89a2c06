/// TRACK READER
///
/// Turns a recording on disk into a `Track`. uBlox u-center KML exports are
/// the primary source; GPX and plain CSV logs are read the same way so the
/// same receiver test can be fed from other loggers.
///
/// The reader also owns the warm-up trim: leading fixes taken before the
/// receiver settled never reach the estimators.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use kml::{Kml, KmlReader};
use log::{debug, info, warn};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::track::{Sample, Track};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackFormat {
    Kml,
    Gpx,
    Csv,
}

impl TrackFormat {
    /// Picks the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "kml" => Some(Self::Kml),
            "gpx" => Some(Self::Gpx),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// A fix as recorded, before trimming.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFix {
    pub sample: Sample,
    pub time: Option<DateTime<Utc>>,
}

/// Every fix read from a file, in recording order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTrack {
    pub fixes: Vec<RawFix>,
}

impl RawTrack {
    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    /// Timestamps, only when every fix carries one.
    fn timestamps(&self) -> Option<Vec<DateTime<Utc>>> {
        self.fixes.iter().map(|f| f.time).collect()
    }

    /// Index of the first fix that survives a `trim_seconds` warm-up.
    ///
    /// Fully timestamped recordings are trimmed on elapsed time, anything else
    /// on sample count at `sample_interval_s`.
    pub fn warm_up_len(&self, trim_seconds: f64, sample_interval_s: f64) -> usize {
        if trim_seconds <= 0.0 {
            return 0;
        }
        match self.timestamps() {
            Some(times) if !times.is_empty() => {
                let start = times[0];
                times
                    .iter()
                    .position(|t| {
                        (*t - start).num_milliseconds() as f64 / 1000.0 >= trim_seconds
                    })
                    .unwrap_or(times.len())
            }
            _ => (trim_seconds / sample_interval_s).ceil() as usize,
        }
    }

    /// Drops the warm-up period and hands back the analysable track.
    pub fn trim_warm_up(&self, trim_seconds: f64, sample_interval_s: f64) -> Result<Track> {
        let skip = self.warm_up_len(trim_seconds, sample_interval_s).min(self.len());
        let track: Track = self.fixes[skip..].iter().map(|f| f.sample).collect();

        info!(
            "trimmed {} warm-up fixes ({}s), {} remain",
            skip,
            trim_seconds,
            track.len()
        );

        if track.len() < 2 {
            return Err(Error::MalformedInput(format!(
                "only {} fixes left after a {}s warm-up trim",
                track.len(),
                trim_seconds
            )));
        }
        Ok(track)
    }
}

impl From<Vec<Sample>> for RawTrack {
    fn from(samples: Vec<Sample>) -> Self {
        Self {
            fixes: samples
                .into_iter()
                .map(|sample| RawFix { sample, time: None })
                .collect(),
        }
    }
}

/// Reads every fix of a recording, format chosen from the extension.
pub fn read_track(path: &Path) -> Result<RawTrack> {
    let format = TrackFormat::from_path(path).ok_or_else(|| {
        Error::MalformedInput(format!("unsupported track file: {}", path.display()))
    })?;

    let reader = BufReader::new(File::open(path)?);
    let raw = match format {
        TrackFormat::Kml => read_kml(reader)?,
        TrackFormat::Gpx => read_gpx(reader)?,
        TrackFormat::Csv => read_csv(reader)?,
    };

    if raw.is_empty() {
        return Err(Error::MalformedInput(format!(
            "no coordinates found in {}",
            path.display()
        )));
    }

    info!("read {} fixes from {} ({:?})", raw.len(), path.display(), format);
    Ok(raw)
}

/// Reads and trims in one go.
pub fn load_track(path: &Path, trim_seconds: f64, sample_interval_s: f64) -> Result<Track> {
    read_track(path)?.trim_warm_up(trim_seconds, sample_interval_s)
}

/// KML: every `<coordinates>` element (`LineString`, `Point`, `LinearRing`
/// and polygon rings) plus `gx:Track` when/coord pairs, in document order.
/// KML coordinates are `lon,lat[,alt]`.
pub fn read_kml<R: BufRead>(reader: R) -> Result<RawTrack> {
    let kml = KmlReader::<_, f64>::from_reader(reader).read()?;
    let mut fixes = Vec::new();
    collect_kml(kml, &mut fixes)?;
    Ok(RawTrack { fixes })
}

fn collect_kml(kml: Kml, fixes: &mut Vec<RawFix>) -> Result<()> {
    match kml {
        Kml::KmlDocument(document) => {
            for element in document.elements {
                collect_kml(element, fixes)?;
            }
        }
        Kml::Document { attrs: _, elements } | Kml::Folder { attrs: _, elements } => {
            for element in elements {
                collect_kml(element, fixes)?;
            }
        }
        Kml::Placemark(placemark) => {
            if let Some(geometry) = placemark.geometry {
                collect_geometry(geometry, fixes);
            }
            for track in placemark.children.into_iter().filter(|e| e.name == "Track") {
                collect_gx_track(track, fixes)?;
            }
        }
        Kml::Point(point) => push_coord(&point.coord, fixes),
        Kml::LineString(line) => line.coords.iter().for_each(|c| push_coord(c, fixes)),
        Kml::LinearRing(ring) => ring.coords.iter().for_each(|c| push_coord(c, fixes)),
        Kml::Polygon(polygon) => collect_polygon(&polygon, fixes),
        Kml::MultiGeometry(multi) => {
            for geometry in multi.geometries {
                collect_geometry(geometry, fixes);
            }
        }
        _ => {}
    }
    Ok(())
}

fn collect_geometry(geometry: kml::types::Geometry, fixes: &mut Vec<RawFix>) {
    use kml::types::Geometry;

    match geometry {
        Geometry::Point(point) => push_coord(&point.coord, fixes),
        Geometry::LineString(line) => line.coords.iter().for_each(|c| push_coord(c, fixes)),
        Geometry::LinearRing(ring) => ring.coords.iter().for_each(|c| push_coord(c, fixes)),
        Geometry::Polygon(polygon) => collect_polygon(&polygon, fixes),
        Geometry::MultiGeometry(multi) => {
            for inner in multi.geometries {
                collect_geometry(inner, fixes);
            }
        }
        other => debug!("skipping kml geometry {:?}", other),
    }
}

/// Outer ring first, then the holes.
fn collect_polygon(polygon: &kml::types::Polygon, fixes: &mut Vec<RawFix>) {
    for ring in std::iter::once(&polygon.outer).chain(polygon.inner.iter()) {
        ring.coords.iter().for_each(|c| push_coord(c, fixes));
    }
}

fn push_coord(coord: &kml::types::Coord, fixes: &mut Vec<RawFix>) {
    fixes.push(RawFix {
        sample: Sample::new(coord.x, coord.y, coord.z.unwrap_or(0.0)),
        time: None,
    });
}

/// `gx:Track` stores parallel `when` / `gx:coord` children; coords are
/// space separated `lon lat alt`.
fn collect_gx_track(track: kml::types::Element, fixes: &mut Vec<RawFix>) -> Result<()> {
    let mut whens = Vec::new();
    let mut coords = Vec::new();
    for child in track.children {
        if child.name == "when" {
            whens.push(child.content);
        } else if child.name == "coord" {
            coords.push(child.content);
        }
    }

    if whens.len() != coords.len() {
        warn!(
            "gx:Track has {} timestamps for {} coordinates",
            whens.len(),
            coords.len()
        );
    }

    for (index, coord) in coords.iter().enumerate() {
        let Some(coord) = coord else {
            continue;
        };
        let fields: Vec<&str> = coord.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(Error::MalformedInput(format!("bad gx:coord '{}'", coord)));
        }
        let time = match whens.get(index).and_then(|w| w.as_deref()) {
            Some(when) => Some(parse_time(when)?),
            None => None,
        };
        fixes.push(RawFix {
            sample: Sample::new(
                parse_number(fields[0])?,
                parse_number(fields[1])?,
                fields.get(2).map(|v| parse_number(v)).transpose()?.unwrap_or(0.0),
            ),
            time,
        });
    }
    Ok(())
}

/// GPX: every track, segment and point in order. Missing elevation reads as 0.
pub fn read_gpx<R: Read>(reader: R) -> Result<RawTrack> {
    let gpx = gpx::read(reader)?;
    let mut fixes = Vec::new();

    for track in &gpx.tracks {
        for segment in &track.segments {
            for point in &segment.points {
                let time = match &point.time {
                    Some(time) => Some(parse_time(&time.format()?)?),
                    None => None,
                };
                fixes.push(RawFix {
                    sample: Sample::new(
                        point.point().x(),
                        point.point().y(),
                        point.elevation.unwrap_or(0.0),
                    ),
                    time,
                });
            }
        }
    }

    Ok(RawTrack { fixes })
}

#[derive(Debug, Deserialize)]
struct CsvFix {
    longitude: f64,
    latitude: f64,
    #[serde(default)]
    altitude: f64,
    #[serde(default)]
    time: Option<DateTime<Utc>>,
}

/// CSV with a `longitude,latitude[,altitude][,time]` header; time is RFC 3339.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTrack> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut fixes = Vec::new();

    for record in rdr.deserialize::<CsvFix>() {
        let record = record?;
        fixes.push(RawFix {
            sample: Sample::new(record.longitude, record.latitude, record.altitude),
            time: record.time,
        });
    }

    Ok(RawTrack { fixes })
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::MalformedInput(format!("bad timestamp '{}': {}", value, e)))
}

fn parse_number(value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|e| Error::MalformedInput(format!("bad number '{}': {}", value, e)))
}
