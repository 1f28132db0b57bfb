use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Public gateway used when none is configured.
pub const DEFAULT_GATEWAY: &str = "https://ipfs.io";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Connection settings for an S3-compatible object store.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    /// Apply a one-year COMPLIANCE retention lock to every write.
    #[serde(default)]
    pub object_lock_enabled: bool,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl S3Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("object_lock_enabled", &self.object_lock_enabled)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Connection settings for an IPFS node's RPC API.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IpfsConfig {
    pub endpoint: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub gateway: Option<String>,
}

impl IpfsConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_ms: None,
            gateway: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }

    pub fn gateway(&self) -> &str {
        self.gateway.as_deref().unwrap_or(DEFAULT_GATEWAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s3() -> S3Config {
        S3Config {
            endpoint: "http://localhost:9000".into(),
            region: "us-east-1".into(),
            access_key_id: "minio".into(),
            secret_access_key: "minio-secret".into(),
            bucket: "evidence".into(),
            object_lock_enabled: false,
            timeout_ms: None,
        }
    }

    #[test]
    fn default_timeouts() {
        assert_eq!(s3().timeout(), Duration::from_secs(30));
        assert_eq!(IpfsConfig::new("http://localhost:5001").timeout(), Duration::from_secs(30));
    }

    #[test]
    fn ipfs_gateway_default_and_override() {
        let mut cfg = IpfsConfig::new("http://localhost:5001");
        assert_eq!(cfg.gateway(), DEFAULT_GATEWAY);
        cfg.gateway = Some("https://dweb.link".into());
        assert_eq!(cfg.gateway(), "https://dweb.link");
    }

    #[test]
    fn debug_redacts_secret() {
        let debug = format!("{:?}", s3());
        assert!(!debug.contains("minio-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
