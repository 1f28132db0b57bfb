use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use evidence_integrity::{IntegrityError, IntegrityMetadata};
use tracing::{debug, warn};

use crate::error::{BackendError, BackendResult};
use crate::traits::{ObjectBackend, ObjectLock, ObjectStoreClient, RetrievedObject};

/// Retention window applied when object lock is enabled.
pub const RETENTION_DAYS: i64 = 365;

/// Longest expiry S3 accepts for a presigned URL.
pub const MAX_SIGNED_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Object-store adapter: embeds integrity metadata as object attributes and
/// verifies it on every read.
pub struct S3Backend<C> {
    client: C,
    object_lock_enabled: bool,
}

impl<C: ObjectStoreClient> S3Backend<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            object_lock_enabled: false,
        }
    }

    /// Apply a COMPLIANCE retention lock of [`RETENTION_DAYS`] to every write.
    pub fn with_object_lock(mut self, enabled: bool) -> Self {
        self.object_lock_enabled = enabled;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn retention(&self) -> Option<ObjectLock> {
        self.object_lock_enabled.then(|| ObjectLock {
            retain_until: Utc::now() + chrono::Duration::days(RETENTION_DAYS),
        })
    }
}

#[async_trait]
impl<C: ObjectStoreClient> ObjectBackend for S3Backend<C> {
    async fn store(
        &self,
        data: &[u8],
        key: &str,
        metadata: &IntegrityMetadata,
    ) -> BackendResult<String> {
        let lock = self.retention();
        debug!(key, size = data.len(), locked = lock.is_some(), "s3 put");
        self.client
            .put(key, data, &metadata.to_attributes(), lock)
            .await?;
        Ok(key.to_string())
    }

    async fn retrieve(&self, key: &str) -> BackendResult<RetrievedObject> {
        let object = self.client.get(key).await?;
        let recorded = IntegrityMetadata::from_attributes(&object.attributes).map_err(|source| {
            BackendError::CorruptMetadata {
                id: key.to_string(),
                source,
            }
        })?;

        let metadata = match recorded {
            Some(metadata) => {
                metadata.check(&object.data).map_err(|err| match err {
                    IntegrityError::Violation { expected, computed } => {
                        warn!(key, %expected, %computed, "s3 object failed verification");
                        BackendError::IntegrityMismatch {
                            id: key.to_string(),
                            expected,
                            computed,
                            recorded: Box::new(metadata.clone()),
                        }
                    }
                    source => BackendError::CorruptMetadata {
                        id: key.to_string(),
                        source,
                    },
                })?;
                metadata
            }
            None => {
                debug!(key, "s3 object carries no integrity attributes");
                IntegrityMetadata::compute(&object.data)
            }
        };

        Ok(RetrievedObject {
            data: object.data,
            metadata,
        })
    }

    async fn exists(&self, key: &str) -> BackendResult<bool> {
        self.client.head(key).await
    }

    async fn signed_url(&self, key: &str, expires_in: Duration) -> BackendResult<String> {
        if expires_in.as_secs() == 0 || expires_in > MAX_SIGNED_URL_TTL {
            return Err(BackendError::InvalidRequest(format!(
                "signed URL expiry must be between 1 and {} seconds, got {}",
                MAX_SIGNED_URL_TTL.as_secs(),
                expires_in.as_secs()
            )));
        }
        self.client.presign_get(key, expires_in).await
    }
}
