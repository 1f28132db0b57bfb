use std::path::Path;

use evidence_backend::{IpfsConfig, S3Config};
use serde::{Deserialize, Serialize};

use crate::error::{EvidenceError, EvidenceResult};

/// Backends the evidence store writes to. At least one must be present.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvidenceStoreConfig {
    #[serde(default)]
    pub s3: Option<S3Config>,
    #[serde(default)]
    pub ipfs: Option<IpfsConfig>,
}

impl EvidenceStoreConfig {
    pub fn from_toml_str(source: &str) -> EvidenceResult<Self> {
        toml::from_str(source)
            .map_err(|e| EvidenceError::Configuration(format!("invalid config: {e}")))
    }

    /// Read a TOML config file.
    pub fn load(path: &Path) -> EvidenceResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            EvidenceError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    pub fn is_empty(&self) -> bool {
        self.s3.is_none() && self.ipfs.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FULL: &str = r#"
        [s3]
        endpoint = "http://localhost:9000"
        region = "eu-west-1"
        access_key_id = "minio"
        secret_access_key = "minio123"
        bucket = "evidence"
        object_lock_enabled = true

        [ipfs]
        endpoint = "http://localhost:5001"
        timeout_ms = 10000
    "#;

    #[test]
    fn parses_both_sections() {
        let config = EvidenceStoreConfig::from_toml_str(FULL).unwrap();
        let s3 = config.s3.unwrap();
        assert_eq!(s3.bucket, "evidence");
        assert!(s3.object_lock_enabled);
        assert_eq!(s3.timeout_ms, None);
        let ipfs = config.ipfs.unwrap();
        assert_eq!(ipfs.timeout_ms, Some(10_000));
        assert_eq!(ipfs.gateway, None);
    }

    #[test]
    fn ipfs_only() {
        let config =
            EvidenceStoreConfig::from_toml_str("[ipfs]\nendpoint = \"http://127.0.0.1:5001\"\n")
                .unwrap();
        assert!(config.s3.is_none());
        assert!(!config.is_empty());
    }

    #[test]
    fn empty_document_has_no_backends() {
        assert!(EvidenceStoreConfig::from_toml_str("").unwrap().is_empty());
    }

    #[test]
    fn missing_required_field_is_configuration_error() {
        let err = EvidenceStoreConfig::from_toml_str("[s3]\nendpoint = \"x\"\n").unwrap_err();
        assert!(matches!(err, EvidenceError::Configuration(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let config = EvidenceStoreConfig::load(file.path()).unwrap();
        assert!(config.s3.is_some());
        assert!(config.ipfs.is_some());
    }

    #[test]
    fn load_missing_file_fails() {
        let err = EvidenceStoreConfig::load(Path::new("/nonexistent/evidence.toml")).unwrap_err();
        assert!(matches!(err, EvidenceError::Configuration(_)));
    }
}
