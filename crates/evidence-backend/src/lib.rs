//! Storage backends for the evidence store.
//!
//! Two layers live here:
//!
//! - **Adapters** ([`ObjectBackend`], [`ContentBackend`]) are what the
//!   evidence store talks to. [`S3Backend`] embeds integrity metadata as
//!   object attributes and verifies it on read; [`IpfsBackend`] pins every
//!   write and derives metadata from fetched bytes.
//! - **Clients** ([`ObjectStoreClient`], [`IpfsClient`]) are the wire
//!   operations underneath: HTTP implementations in [`http`] and in-memory
//!   ones in [`memory`] for tests and embedding.
//!
//! Clients own their connection pools exclusively and never retry; a timeout
//! is reported as an ordinary [`BackendError::Timeout`].

pub mod config;
pub mod error;
pub mod http;
pub mod ipfs;
pub mod memory;
pub mod s3;
pub mod traits;

pub use config::{IpfsConfig, S3Config, DEFAULT_GATEWAY};
pub use error::{BackendError, BackendResult};
pub use http::{IpfsHttpClient, S3HttpClient};
pub use ipfs::IpfsBackend;
pub use memory::{InMemoryIpfsClient, InMemoryObjectClient};
pub use s3::{S3Backend, MAX_SIGNED_URL_TTL, RETENTION_DAYS};
pub use traits::{
    BackendKind, ContentBackend, IpfsClient, ObjectBackend, ObjectData, ObjectLock,
    ObjectStoreClient, RetrievedObject,
};
