use thiserror::Error;
use tonepeak_core::DemodError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Demod(#[from] DemodError),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported WAV format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid bit list '{0}': expected 0/1 values separated by commas or nothing")]
    InvalidBits(String),

    #[error("Unknown output format for {0}: use a .csv, .json or .xlsx extension")]
    UnknownOutputFormat(String),
}
