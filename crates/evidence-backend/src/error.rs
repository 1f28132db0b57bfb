use evidence_integrity::{IntegrityError, IntegrityMetadata};

/// Errors from backend adapters and their clients.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The requested key or content address does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Stored bytes do not match the hash recorded alongside them.
    #[error("integrity mismatch for {id}: expected {expected}, computed {computed}")]
    IntegrityMismatch {
        id: String,
        expected: String,
        computed: String,
        /// Metadata recorded at write time.
        recorded: Box<IntegrityMetadata>,
    },

    /// Stored integrity attributes could not be decoded.
    #[error("corrupt metadata for {id}: {source}")]
    CorruptMetadata {
        id: String,
        #[source]
        source: IntegrityError,
    },

    /// The backend is unreachable or refused service.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    /// The remote answered with an unexpected status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The caller asked for something the backend cannot do.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl BackendError {
    /// Returns `true` for a definitive "does not exist" answer.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Unavailable(err.to_string())
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
