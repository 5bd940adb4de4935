use std::time::Duration;
use thiserror::Error;

// Main application error type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Acquisition Error: {0}")]
    Acquisition(#[from] AcquisitionError),
    #[error("Pipeline Error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("Configuration Error: {0}")]
    Config(String),
}

// Errors raised by the depth acquisition collaborator. Both variants are
// recoverable: the coordinator skips the tick and retains all prior state.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("depth source unavailable: {0}")]
    Unavailable(String),
    #[error("no depth frame arrived within {0:?}")]
    Timeout(Duration),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("grid shape mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    ShapeMismatch {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },
    #[error("invalid boundary: {0}")]
    InvalidBoundary(&'static str),
    #[error("{count} concurrent blobs exceed the {capacity}-color palette")]
    TooManyBlobs { count: usize, capacity: usize },
}
