use thiserror::Error;

#[derive(Debug, Error)]
pub enum DemodError {
    #[error("Invalid filter specification: {0}")]
    InvalidFilterSpec(String),

    #[error("Insufficient samples for zero-phase filtering: need more than {needed}, got {got}")]
    InsufficientSamples { needed: usize, got: usize },

    #[error("Expected parity has {expected} entries but {frames} frames were decoded")]
    ConfigurationMismatch { expected: usize, frames: usize },

    #[error("Invalid sample buffer: {0}")]
    InvalidSampleBuffer(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid bit value: {0}")]
    InvalidBit(u8),

    #[error("FFT error: {0}")]
    FftError(String),

    #[error("Audio capture failed: {0}")]
    Capture(String),

    #[error("Result export failed: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, DemodError>;
