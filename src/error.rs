use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while opening or reading an audio source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The container or encoding could not be recognized or decoded.
    #[error("Unsupported audio format in {path}: {reason}")]
    UnsupportedFormat {
        /// File the probe or decode gave up on.
        path: PathBuf,
        /// Decoder-reported reason.
        reason: String,
    },
    /// Opening or reading the underlying file failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors raised by buffer and aggregate operations.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Errors raised while computing feature vectors.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Decoding the source failed before any feature was computed.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// A configured parameter value is outside its legal bounds.
    #[error("Invalid value {value} for parameter \"{name}\" of {feature}: legal range is [{min}, {max}]")]
    InvalidParameter {
        feature: &'static str,
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// A feature was scheduled before one of its prerequisites. Unreachable
    /// when the resolution order is built through the catalog graph.
    #[error("{feature} was scheduled before its prerequisite {prerequisite}")]
    DependencyOrder {
        feature: &'static str,
        prerequisite: &'static str,
    },
}
