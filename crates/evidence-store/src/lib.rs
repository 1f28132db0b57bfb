//! Dual-backend evidence storage.
//!
//! [`EvidenceStore`] writes a payload to an S3-compatible object store and an
//! IPFS node at the same time, tolerating the loss of either, and reads it
//! back with fallback from the object store to the content address. Every
//! payload is fingerprinted once before any backend sees it, and every read
//! is checked against that fingerprint.
//!
//! # Failure Policy
//!
//! 1. A store succeeds if at least one backend accepted the write.
//! 2. A store where every configured backend failed returns
//!    [`EvidenceError::AllBackendsFailed`].
//! 3. A retrieval returns the error of the last source it tried.
//! 4. Existence probes never fail; errors read as "absent".
//! 5. Bytes that do not match their recorded hash are never returned from a
//!    retrieval.

pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::EvidenceStoreConfig;
pub use error::{EvidenceError, EvidenceResult};
pub use store::{EvidenceStore, DEFAULT_KEY_PREFIX, DEFAULT_SIGNED_URL_TTL};
pub use types::{
    BackendFailure, EvidenceMetadata, ExistenceReport, RetrievedEvidence, SourceSelector,
    StoreOptions, StoredEvidence,
};

// Re-export the pieces callers need to assemble a store by hand.
pub use evidence_backend::{
    BackendError, BackendKind, ContentBackend, IpfsBackend, IpfsConfig, ObjectBackend, S3Backend,
    S3Config,
};
pub use evidence_integrity::{ContentHash, IntegrityMetadata};
