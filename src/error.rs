use thiserror::Error;

/// Errors raised by matrix algebra, network construction, persistence and training.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("shape mismatch in {op}: left {left:?}, right {right:?}")]
    ShapeMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("unknown activation code {0}")]
    UnknownActivation(i64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NetworkError>;

impl NetworkError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        NetworkError::Parse { line, message: message.into() }
    }
}
