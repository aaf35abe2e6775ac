use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid instance identifier: {0:?}")]
    InvalidIdentifier(String),
    #[error("invalid patient identifier: {0:?}")]
    InvalidPatientId(String),
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
    #[error("unknown {kind} code: {value:?}")]
    UnknownCode { kind: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
