//! Error types for occupancy grid rendering

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("Malformed grid message: {0}")]
    MalformedMessage(String),

    #[error("Dimension mismatch: bound {expected_width}x{expected_height}, got {width}x{height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },

    #[error("Render state used after dispose")]
    UseAfterDispose,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Export error: {0}")]
    Export(String),
}
