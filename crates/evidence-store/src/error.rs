use evidence_backend::{BackendError, BackendKind};
use thiserror::Error;

use crate::types::BackendFailure;

#[derive(Debug, Error)]
pub enum EvidenceError {
    /// No backend configured, or configuration could not be read.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("all storage backends failed: {}", describe(.failures))]
    AllBackendsFailed { failures: Vec<BackendFailure> },

    /// The selector names no identifier with a configured backend.
    #[error("no source available: selector matches no configured backend")]
    NoSourceAvailable,

    #[error("integrity check failed: expected {expected}, computed {computed}")]
    Integrity { expected: String, computed: String },

    #[error("{0} backend is not configured")]
    BackendNotConfigured(BackendKind),

    /// Backend-native failure (not found, network, timeout) passed through.
    #[error("{backend} backend error: {source}")]
    Backend {
        backend: BackendKind,
        #[source]
        source: BackendError,
    },
}

impl EvidenceError {
    /// Attribute a backend error, lifting hash mismatches to `Integrity`.
    pub fn from_backend(backend: BackendKind, source: BackendError) -> Self {
        match source {
            BackendError::IntegrityMismatch {
                expected, computed, ..
            } => Self::Integrity { expected, computed },
            source => Self::Backend { backend, source },
        }
    }

    /// Returns `true` if the underlying backend reported "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Backend { source, .. } if source.is_not_found())
    }
}

fn describe(failures: &[BackendFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.backend, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type EvidenceResult<T> = Result<T, EvidenceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use evidence_integrity::IntegrityMetadata;

    #[test]
    fn integrity_mismatch_is_lifted() {
        let err = EvidenceError::from_backend(
            BackendKind::ObjectStore,
            BackendError::IntegrityMismatch {
                id: "k".into(),
                expected: "0xaa".into(),
                computed: "0xbb".into(),
                recorded: Box::new(IntegrityMetadata::compute(b"x")),
            },
        );
        assert!(matches!(err, EvidenceError::Integrity { ref expected, .. } if expected == "0xaa"));
    }

    #[test]
    fn other_errors_keep_backend() {
        let err = EvidenceError::from_backend(
            BackendKind::ContentAddressed,
            BackendError::NotFound("cid".into()),
        );
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "ipfs backend error: not found: cid");
    }

    #[test]
    fn all_failed_lists_each_backend() {
        let err = EvidenceError::AllBackendsFailed {
            failures: vec![
                BackendFailure {
                    backend: BackendKind::ObjectStore,
                    error: "timeout".into(),
                },
                BackendFailure {
                    backend: BackendKind::ContentAddressed,
                    error: "offline".into(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "all storage backends failed: s3: timeout; ipfs: offline"
        );
    }
}
