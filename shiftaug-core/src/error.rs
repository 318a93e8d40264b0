use thiserror::Error;

/// All errors produced by shiftaug-core.
#[derive(Debug, Error)]
pub enum ShiftError {
    #[error("invalid shift config: {0}")]
    Config(String),

    #[error("shift bound of {value} samples does not fit in a signed 32-bit integer")]
    Range { value: f64 },

    #[error("shift_unit \"seconds\" requires a positive sample rate")]
    MissingSampleRate,

    #[error("expected a rank-2 (channels, time) or rank-3 (batch, channels, time) array, got rank {0}")]
    Rank(usize),

    #[error("shift vector has {got} entries for a batch of {expected}")]
    ShiftLength { expected: usize, got: usize },

    #[error("clip mismatch: {0}")]
    ClipMismatch(String),

    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("resampler error: {0}")]
    Resample(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ShiftError>;
