use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use evidence_integrity::IntegrityMetadata;
use serde::{Deserialize, Serialize};

use crate::error::BackendResult;

/// Which backend an identifier, result or failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BackendKind {
    #[serde(rename = "s3")]
    ObjectStore,
    #[serde(rename = "ipfs")]
    ContentAddressed,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ObjectStore => "s3",
            Self::ContentAddressed => "ipfs",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bytes read back from a backend together with their integrity metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrievedObject {
    pub data: Vec<u8>,
    pub metadata: IntegrityMetadata,
}

/// Raw object as returned by an object-store client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectData {
    pub data: Vec<u8>,
    /// User metadata, without any protocol-specific prefix.
    pub attributes: BTreeMap<String, String>,
}

/// Write-once retention applied to an object (COMPLIANCE mode).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectLock {
    pub retain_until: DateTime<Utc>,
}

/// Key/value object storage adapter consumed by the evidence store.
///
/// Implementations embed integrity metadata on write and must refuse to
/// return bytes that no longer match it.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Write `data` under `key`, attaching `metadata`. Returns the key used.
    async fn store(
        &self,
        data: &[u8],
        key: &str,
        metadata: &IntegrityMetadata,
    ) -> BackendResult<String>;

    /// Read and verify the object under `key`.
    async fn retrieve(&self, key: &str) -> BackendResult<RetrievedObject>;

    /// Head-only existence probe.
    async fn exists(&self, key: &str) -> BackendResult<bool>;

    /// Time-limited read URL for `key`.
    async fn signed_url(&self, key: &str, expires_in: Duration) -> BackendResult<String>;
}

/// Content-addressed storage adapter consumed by the evidence store.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    /// Add and pin `data`. Returns its content address.
    async fn store(&self, data: &[u8]) -> BackendResult<String>;

    /// Fetch the content at `address`.
    async fn retrieve(&self, address: &str) -> BackendResult<RetrievedObject>;

    /// Existence probe through the pin set.
    async fn exists(&self, address: &str) -> BackendResult<bool>;

    /// Public gateway URL for `address`. Pure string composition.
    fn gateway_url(&self, address: &str, gateway: Option<&str>) -> String;
}

/// Wire-level operations of an S3-compatible object store.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    async fn put(
        &self,
        key: &str,
        data: &[u8],
        attributes: &BTreeMap<String, String>,
        lock: Option<ObjectLock>,
    ) -> BackendResult<()>;

    /// Fails with `NotFound` when the key is absent.
    async fn get(&self, key: &str) -> BackendResult<ObjectData>;

    async fn head(&self, key: &str) -> BackendResult<bool>;

    async fn presign_get(&self, key: &str, expires_in: Duration) -> BackendResult<String>;
}

/// Wire-level operations of an IPFS node.
#[async_trait]
pub trait IpfsClient: Send + Sync {
    async fn add(&self, data: &[u8], pin: bool) -> BackendResult<String>;

    async fn cat(&self, address: &str) -> BackendResult<Vec<u8>>;

    /// Returns `true` if `address` is in the node's recursive pin set.
    async fn pin_ls(&self, address: &str) -> BackendResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_display() {
        assert_eq!(BackendKind::ObjectStore.to_string(), "s3");
        assert_eq!(BackendKind::ContentAddressed.to_string(), "ipfs");
    }

    #[test]
    fn backend_kind_serializes_short_name() {
        let json = serde_json::to_string(&BackendKind::ContentAddressed).unwrap();
        assert_eq!(json, "\"ipfs\"");
    }
}
