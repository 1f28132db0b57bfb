use thiserror::Error;

/// Errors produced when parsing or checking integrity data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("invalid content hash {value:?}: {reason}")]
    InvalidHash { value: String, reason: String },

    #[error("missing attribute: {0}")]
    MissingAttribute(&'static str),

    #[error("invalid attribute {name}: {reason}")]
    InvalidAttribute { name: &'static str, reason: String },

    /// Payload bytes do not match the recorded hash or size.
    #[error("integrity violation: expected {expected}, computed {computed}")]
    Violation { expected: String, computed: String },
}
