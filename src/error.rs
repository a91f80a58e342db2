//! Error type shared by every part of the loading pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring, materializing or iterating datasets.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("valid_split must lie in [0, 1), got {0}")]
    InvalidSplit(f64),

    #[error("{name} must be a positive integer")]
    InvalidBatchSize { name: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("dataset file not found: {0} (enable download to fetch it)")]
    MissingFile(PathBuf),

    #[error("malformed dataset file {path}: {reason}")]
    Format { path: PathBuf, reason: String },

    #[error("index {index} is out of range for a dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("sample shape mismatch in batch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl DataError {
    /// True for errors caused by the option set rather than the environment.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            DataError::InvalidSplit(_) | DataError::InvalidBatchSize { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
