//! Content hashing and integrity metadata for stored evidence.
//!
//! Every payload handed to the evidence store is fingerprinted with SHA-256
//! before it reaches any backend. The digest is rendered as a self-describing
//! string (`0x` followed by 64 lowercase hex characters) so it reads the same
//! in logs, object attributes and CLI output.
//!
//! # Key Types
//!
//! - [`ContentHash`]: validated, prefixed SHA-256 digest
//! - [`IntegrityMetadata`]: hash, size and creation timestamp of a payload
//!
//! Hashing never performs I/O and never fails. Only
//! [`IntegrityMetadata::compute`] reads the system clock.

pub mod error;
pub mod hash;
pub mod metadata;

pub use error::IntegrityError;
pub use hash::{digest, verify, ContentHash, HASH_PREFIX};
pub use metadata::{IntegrityMetadata, ATTR_HASH, ATTR_SIZE, ATTR_TIMESTAMP};
