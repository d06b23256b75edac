//! # Error Types
//!
//! Errors surfaced by the extraction engine.

use thiserror::Error;

use crate::source::SourceError;

pub type ExtractResult<T> = Result<T, ExtractError>;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// Bad planner or run parameters; raised before any I/O happens.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// One range failed; the run produces no output.
    #[error("scan failed for range {range_index}: {cause}")]
    ScanFailed {
        range_index: usize,
        #[source]
        cause: Box<ExtractError>,
    },
    #[error("worker thread panicked")]
    WorkerPanicked,
    #[error("extraction cancelled")]
    Cancelled,
}

impl From<SourceError> for ExtractError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Io(io) => ExtractError::Io(io),
        }
    }
}

impl ExtractError {
    pub fn scan_failed(range_index: usize, cause: ExtractError) -> Self {
        ExtractError::ScanFailed {
            range_index,
            cause: Box::new(cause),
        }
    }

    /// Index of the failing range, when the error is range-scoped.
    pub fn range_index(&self) -> Option<usize> {
        match self {
            ExtractError::ScanFailed { range_index, .. } => Some(*range_index),
            _ => None,
        }
    }
}
