//! Typed error hierarchy for the detection pipeline and its collaborators.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced anywhere in the `gate_vision` library.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration file could not be read from disk.
    #[error("could not read config file {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file's contents were not valid YAML, or did not map
    /// onto the expected schema.
    #[error("could not parse config file {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The configuration parsed, but failed semantic validation (e.g. no
    /// gates, duplicate gate names, malformed hue bounds).
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// The video source could not be opened.
    #[error("could not open video source {path:?}: {reason}")]
    VideoSourceOpen { path: String, reason: String },

    /// A read from the video source failed (not simple end-of-stream).
    #[error("failed to read frame from video source: {0}")]
    VideoSourceRead(String),

    /// An OpenCV operation failed during segmentation or attribution.
    #[error("image processing error: {0}")]
    ImageProcessing(String),

    /// A ring buffer was indexed at or beyond its current length.
    #[error("index {index} out of bounds for ring buffer of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

impl From<opencv::Error> for Error {
    fn from(e: opencv::Error) -> Self {
        Error::ImageProcessing(e.to_string())
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;
