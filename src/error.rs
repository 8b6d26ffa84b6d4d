//! Error type shared by every stage of the well-signal pipeline.
//!
//! Configuration problems, missing background inputs and out-of-range frame
//! requests are all fatal for a run; the driver logs them and exits non-zero.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid bit depth: {0} (expected 8, 12 or 16)")]
    InvalidBitDepth(u32),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Plate format of background recording does not match the recording wells")]
    PlateMismatch,

    #[error("{what} ({}) not found", path.display())]
    MissingPath { what: &'static str, path: PathBuf },

    #[error("Frame index {index} exceeds number of frames ({num_frames})")]
    FrameOutOfRange { index: usize, num_frames: usize },

    #[error("Recording holds {actual} bytes but {expected} are needed for the configured frames")]
    RecordingTooShort { expected: u64, actual: u64 },

    #[error("Invalid container: {0}")]
    InvalidContainer(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data frame error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("Failed to load configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Failed to parse settings file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to build archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to serialize metadata: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Figment(Box::new(err))
    }
}
