use std::sync::Arc;
use std::time::Duration;

use evidence_backend::{
    BackendError, BackendKind, BackendResult, ContentBackend, IpfsBackend, IpfsHttpClient,
    ObjectBackend, RetrievedObject, S3Backend, S3HttpClient,
};
use evidence_integrity::{ContentHash, IntegrityMetadata};
use tracing::{debug, info, warn};

use crate::config::EvidenceStoreConfig;
use crate::error::{EvidenceError, EvidenceResult};
use crate::types::{
    BackendFailure, EvidenceMetadata, ExistenceReport, RetrievedEvidence, SourceSelector,
    StoreOptions, StoredEvidence,
};

/// Prefix of object keys derived from the content hash.
pub const DEFAULT_KEY_PREFIX: &str = "evidence/";

/// Expiry of signed URLs when the caller does not choose one.
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// Stores evidence redundantly across an object store and a content-addressed
/// store.
///
/// Writes fan out to every configured backend and succeed if any one of them
/// accepts the payload. Reads try the object store first and fall back to the
/// content address. The store keeps no state between calls.
pub struct EvidenceStore {
    object_store: Option<Arc<dyn ObjectBackend>>,
    content_store: Option<Arc<dyn ContentBackend>>,
}

/// A place a retrieval may read from, in attempt order.
enum Candidate<'a> {
    ObjectStore(&'a dyn ObjectBackend, &'a str),
    ContentAddressed(&'a dyn ContentBackend, &'a str),
}

impl Candidate<'_> {
    fn kind(&self) -> BackendKind {
        match self {
            Self::ObjectStore(..) => BackendKind::ObjectStore,
            Self::ContentAddressed(..) => BackendKind::ContentAddressed,
        }
    }

    fn id(&self) -> &str {
        match self {
            Self::ObjectStore(_, id) | Self::ContentAddressed(_, id) => id,
        }
    }

    async fn read(&self) -> BackendResult<RetrievedObject> {
        match self {
            Self::ObjectStore(backend, key) => backend.retrieve(key).await,
            Self::ContentAddressed(backend, address) => backend.retrieve(address).await,
        }
    }
}

impl EvidenceStore {
    /// Compose the store from adapters. Fails if neither is given.
    pub fn new(
        object_store: Option<Arc<dyn ObjectBackend>>,
        content_store: Option<Arc<dyn ContentBackend>>,
    ) -> EvidenceResult<Self> {
        if object_store.is_none() && content_store.is_none() {
            return Err(EvidenceError::Configuration(
                "at least one storage backend (s3 or ipfs) must be configured".into(),
            ));
        }
        Ok(Self {
            object_store,
            content_store,
        })
    }

    /// Build HTTP-backed adapters for every configured section.
    pub fn from_config(config: &EvidenceStoreConfig) -> EvidenceResult<Self> {
        let object_store = match &config.s3 {
            Some(s3) => {
                let client = S3HttpClient::new(s3)
                    .map_err(|e| EvidenceError::Configuration(format!("s3: {e}")))?;
                let backend = S3Backend::new(client).with_object_lock(s3.object_lock_enabled);
                Some(Arc::new(backend) as Arc<dyn ObjectBackend>)
            }
            None => None,
        };
        let content_store = match &config.ipfs {
            Some(ipfs) => {
                let client = IpfsHttpClient::new(ipfs)
                    .map_err(|e| EvidenceError::Configuration(format!("ipfs: {e}")))?;
                let backend = IpfsBackend::new(client).with_gateway(ipfs.gateway());
                Some(Arc::new(backend) as Arc<dyn ContentBackend>)
            }
            None => None,
        };
        Self::new(object_store, content_store)
    }

    pub fn has_object_store(&self) -> bool {
        self.object_store.is_some()
    }

    pub fn has_content_store(&self) -> bool {
        self.content_store.is_some()
    }

    /// Key used when the caller does not supply one.
    pub fn default_object_key(hash: &ContentHash) -> String {
        format!("{DEFAULT_KEY_PREFIX}{}", hash.hex_digest())
    }

    /// Write `data` to every configured backend.
    ///
    /// Both writes are issued together and both are awaited to completion.
    /// Succeeds if at least one backend accepted the payload; backends that
    /// failed are listed in [`StoredEvidence::failures`].
    pub async fn store(
        &self,
        data: &[u8],
        options: StoreOptions,
    ) -> EvidenceResult<StoredEvidence> {
        let metadata = IntegrityMetadata::compute(data);
        let key = options
            .object_store_key
            .unwrap_or_else(|| Self::default_object_key(&metadata.hash));

        let object_write = async {
            match &self.object_store {
                Some(backend) => Some(backend.store(data, &key, &metadata).await),
                None => None,
            }
        };
        let content_write = async {
            match &self.content_store {
                Some(backend) => Some(backend.store(data).await),
                None => None,
            }
        };
        let (object_outcome, content_outcome) = tokio::join!(object_write, content_write);

        let mut stored = StoredEvidence {
            hash: metadata.hash.clone(),
            size: metadata.size,
            timestamp: metadata.timestamp.clone(),
            object_store_key: None,
            content_address: None,
            failures: Vec::new(),
        };

        match object_outcome {
            Some(Ok(key)) => stored.object_store_key = Some(key),
            Some(Err(err)) => {
                warn!(
                    backend = %BackendKind::ObjectStore,
                    hash = %metadata.hash,
                    error = %err,
                    "evidence write failed"
                );
                stored.failures.push(BackendFailure {
                    backend: BackendKind::ObjectStore,
                    error: err.to_string(),
                });
            }
            None => {}
        }
        match content_outcome {
            Some(Ok(address)) => stored.content_address = Some(address),
            Some(Err(err)) => {
                warn!(
                    backend = %BackendKind::ContentAddressed,
                    hash = %metadata.hash,
                    error = %err,
                    "evidence write failed"
                );
                stored.failures.push(BackendFailure {
                    backend: BackendKind::ContentAddressed,
                    error: err.to_string(),
                });
            }
            None => {}
        }

        if stored.object_store_key.is_none() && stored.content_address.is_none() {
            return Err(EvidenceError::AllBackendsFailed {
                failures: stored.failures,
            });
        }

        info!(
            hash = %stored.hash,
            size = stored.size,
            s3 = stored.object_store_key.as_deref().unwrap_or("-"),
            ipfs = stored.content_address.as_deref().unwrap_or("-"),
            partial = stored.is_partial(),
            "evidence stored"
        );
        Ok(stored)
    }

    fn candidates<'a>(&'a self, selector: &'a SourceSelector) -> Vec<Candidate<'a>> {
        let mut candidates = Vec::with_capacity(2);
        if let (Some(backend), Some(key)) = (&self.object_store, &selector.object_store_key) {
            candidates.push(Candidate::ObjectStore(backend.as_ref(), key));
        }
        if let (Some(backend), Some(address)) = (&self.content_store, &selector.content_address) {
            candidates.push(Candidate::ContentAddressed(backend.as_ref(), address));
        }
        candidates
    }

    /// Try each candidate in order. On failure, yields the last attempted
    /// backend and its native error, or `None` when nothing was attempted.
    async fn read_with_fallback(
        &self,
        selector: &SourceSelector,
    ) -> Result<RetrievedEvidence, Option<(BackendKind, BackendError)>> {
        let candidates = self.candidates(selector);
        let attempts = candidates.len();
        let mut last_error = None;

        for (attempt, candidate) in candidates.iter().enumerate() {
            let kind = candidate.kind();
            match candidate.read().await {
                Ok(object) => {
                    info!(
                        backend = %kind,
                        id = candidate.id(),
                        size = object.metadata.size,
                        "evidence retrieved"
                    );
                    return Ok(RetrievedEvidence {
                        data: object.data,
                        metadata: object.metadata,
                        source: kind,
                    });
                }
                Err(err) => {
                    if attempt + 1 < attempts {
                        warn!(
                            backend = %kind,
                            id = candidate.id(),
                            error = %err,
                            "retrieval failed, trying next source"
                        );
                    }
                    last_error = Some((kind, err));
                }
            }
        }
        Err(last_error)
    }

    /// Read evidence, object store first, content address as fallback.
    ///
    /// Only the error of the last attempted source is returned. A selector
    /// with no usable identifier fails with
    /// [`EvidenceError::NoSourceAvailable`].
    pub async fn retrieve(&self, selector: &SourceSelector) -> EvidenceResult<RetrievedEvidence> {
        self.read_with_fallback(selector).await.map_err(|last| match last {
            Some((kind, err)) => EvidenceError::from_backend(kind, err),
            None => EvidenceError::NoSourceAvailable,
        })
    }

    /// Check `data` against `expected_hash`. No I/O.
    pub fn verify(&self, data: &[u8], expected_hash: &str) -> bool {
        evidence_integrity::verify(data, expected_hash)
    }

    /// Retrieve the evidence and recompute its hash.
    ///
    /// Bytes that fail verification are reported with `verified: false` and
    /// the metadata recorded at write time instead of an error. Pays the full
    /// transfer cost; use [`exists`](Self::exists) for a cheap presence check.
    pub async fn get_metadata(
        &self,
        selector: &SourceSelector,
    ) -> EvidenceResult<EvidenceMetadata> {
        let (metadata, verified) = match self.read_with_fallback(selector).await {
            Ok(found) => {
                let verified =
                    evidence_integrity::verify(&found.data, found.metadata.hash.as_str());
                if !verified {
                    warn!(
                        backend = %found.source,
                        expected = %found.metadata.hash,
                        "retrieved evidence does not match its recorded hash"
                    );
                }
                (found.metadata, verified)
            }
            Err(Some((kind, BackendError::IntegrityMismatch { computed, recorded, .. }))) => {
                warn!(
                    backend = %kind,
                    expected = %recorded.hash,
                    %computed,
                    "retrieved evidence does not match its recorded hash"
                );
                (*recorded, false)
            }
            Err(Some((kind, err))) => return Err(EvidenceError::from_backend(kind, err)),
            Err(None) => return Err(EvidenceError::NoSourceAvailable),
        };

        Ok(EvidenceMetadata {
            hash: metadata.hash,
            size: metadata.size,
            timestamp: metadata.timestamp,
            object_store_key: selector.object_store_key.clone(),
            content_address: selector.content_address.clone(),
            verified,
        })
    }

    /// Probe each named backend concurrently. Never fails; a probe error
    /// counts as absent.
    pub async fn exists(&self, selector: &SourceSelector) -> ExistenceReport {
        let object_probe = async {
            match (&self.object_store, &selector.object_store_key) {
                (Some(backend), Some(key)) => backend.exists(key).await.unwrap_or_else(|err| {
                    debug!(
                        backend = %BackendKind::ObjectStore,
                        key = %key,
                        error = %err,
                        "existence probe failed"
                    );
                    false
                }),
                _ => false,
            }
        };
        let content_probe = async {
            match (&self.content_store, &selector.content_address) {
                (Some(backend), Some(address)) => {
                    backend.exists(address).await.unwrap_or_else(|err| {
                        debug!(
                            backend = %BackendKind::ContentAddressed,
                            address = %address,
                            error = %err,
                            "existence probe failed"
                        );
                        false
                    })
                }
                _ => false,
            }
        };
        let (object_store, content_address) = tokio::join!(object_probe, content_probe);
        ExistenceReport {
            object_store,
            content_address,
        }
    }

    /// Time-limited read URL from the object store (default one hour).
    pub async fn signed_url(
        &self,
        key: &str,
        expires_in: Option<Duration>,
    ) -> EvidenceResult<String> {
        let backend = self
            .object_store
            .as_ref()
            .ok_or(EvidenceError::BackendNotConfigured(BackendKind::ObjectStore))?;
        backend
            .signed_url(key, expires_in.unwrap_or(DEFAULT_SIGNED_URL_TTL))
            .await
            .map_err(|e| EvidenceError::from_backend(BackendKind::ObjectStore, e))
    }

    /// Public gateway URL for a content address.
    pub fn gateway_url(&self, address: &str, gateway: Option<&str>) -> EvidenceResult<String> {
        let backend = self
            .content_store
            .as_ref()
            .ok_or(EvidenceError::BackendNotConfigured(BackendKind::ContentAddressed))?;
        Ok(backend.gateway_url(address, gateway))
    }
}

impl std::fmt::Debug for EvidenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceStore")
            .field("object_store", &self.has_object_store())
            .field("content_store", &self.has_content_store())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidence_backend::{IpfsConfig, S3Config};
    use evidence_integrity::digest;

    #[test]
    fn default_key_strips_prefix() {
        let key = EvidenceStore::default_object_key(&digest(b"hello world"));
        assert_eq!(
            key,
            "evidence/b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn new_without_backends_is_configuration_error() {
        let err = EvidenceStore::new(None, None).unwrap_err();
        assert!(matches!(err, EvidenceError::Configuration(_)));
    }

    #[test]
    fn from_empty_config_is_configuration_error() {
        let err = EvidenceStore::from_config(&EvidenceStoreConfig::default()).unwrap_err();
        assert!(matches!(err, EvidenceError::Configuration(_)));
    }

    #[test]
    fn from_config_builds_configured_backends() {
        let config = EvidenceStoreConfig {
            s3: Some(S3Config {
                endpoint: "http://localhost:9000".into(),
                region: "us-east-1".into(),
                access_key_id: "a".into(),
                secret_access_key: "b".into(),
                bucket: "evidence".into(),
                object_lock_enabled: true,
                timeout_ms: None,
            }),
            ipfs: None,
        };
        let store = EvidenceStore::from_config(&config).unwrap();
        assert!(store.has_object_store());
        assert!(!store.has_content_store());

        let ipfs_only = EvidenceStoreConfig {
            s3: None,
            ipfs: Some(IpfsConfig::new("http://localhost:5001")),
        };
        let store = EvidenceStore::from_config(&ipfs_only).unwrap();
        assert!(!store.has_object_store());
        assert!(store.has_content_store());
    }

    #[test]
    fn from_config_rejects_bad_endpoint() {
        let config = EvidenceStoreConfig {
            s3: None,
            ipfs: Some(IpfsConfig::new("")),
        };
        assert!(matches!(
            EvidenceStore::from_config(&config),
            Err(EvidenceError::Configuration(_))
        ));
    }
}
