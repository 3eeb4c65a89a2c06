use thiserror::Error;

/// Everything that can stop an analysis run.
///
/// None of these are transient: a run that hits one of them is over, and no
/// partial metric is ever reported for it.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid coordinate: longitude {longitude}, latitude {latitude}")]
    InvalidCoordinate { longitude: f64, latitude: f64 },

    #[error("insufficient samples: {required} required, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("gpx error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),

    #[error("kml error: {0}")]
    Kml(#[from] kml::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
