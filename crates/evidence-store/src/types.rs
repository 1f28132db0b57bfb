use evidence_backend::BackendKind;
use evidence_integrity::{ContentHash, IntegrityMetadata};
use serde::{Deserialize, Serialize};

/// Identifiers locating previously stored evidence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_store_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_address: Option<String>,
}

impl SourceSelector {
    pub fn object_store(key: impl Into<String>) -> Self {
        Self {
            object_store_key: Some(key.into()),
            content_address: None,
        }
    }

    pub fn content_address(address: impl Into<String>) -> Self {
        Self {
            object_store_key: None,
            content_address: Some(address.into()),
        }
    }

    pub fn with_object_store_key(mut self, key: impl Into<String>) -> Self {
        self.object_store_key = Some(key.into());
        self
    }

    pub fn with_content_address(mut self, address: impl Into<String>) -> Self {
        self.content_address = Some(address.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.object_store_key.is_none() && self.content_address.is_none()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Overrides the hash-derived object key.
    pub object_store_key: Option<String>,
}

/// A backend that failed during an otherwise successful store, or during a
/// store where every backend failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendFailure {
    pub backend: BackendKind,
    pub error: String,
}

/// Outcome of a dual-backend write.
///
/// Backend identifiers are present only for backends that accepted the write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvidence {
    pub hash: ContentHash,
    pub size: u64,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_store_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_address: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<BackendFailure>,
}

impl StoredEvidence {
    /// `true` when some configured backend did not accept the write.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Bytes read back from one backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrievedEvidence {
    pub data: Vec<u8>,
    pub metadata: IntegrityMetadata,
    /// Backend that served the bytes.
    pub source: BackendKind,
}

/// Metadata of stored evidence plus a freshly computed verification flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceMetadata {
    pub hash: ContentHash,
    pub size: u64,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_store_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_address: Option<String>,
    pub verified: bool,
}

/// Best-effort existence probe results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistenceReport {
    pub object_store: bool,
    pub content_address: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidence_integrity::digest;

    #[test]
    fn selector_builders() {
        let sel = SourceSelector::object_store("k").with_content_address("cid");
        assert_eq!(sel.object_store_key.as_deref(), Some("k"));
        assert_eq!(sel.content_address.as_deref(), Some("cid"));
        assert!(!sel.is_empty());
        assert!(SourceSelector::default().is_empty());
    }

    #[test]
    fn stored_evidence_json_omits_absent_fields() {
        let stored = StoredEvidence {
            hash: digest(b"hello world"),
            size: 11,
            timestamp: "2024-05-01T12:00:00.000Z".into(),
            object_store_key: Some("evidence/b94d".into()),
            content_address: None,
            failures: vec![],
        };
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["objectStoreKey"], "evidence/b94d");
        assert!(json.get("contentAddress").is_none());
        assert!(json.get("failures").is_none());
        assert!(!stored.is_partial());
    }

    #[test]
    fn existence_report_json() {
        let report = ExistenceReport {
            object_store: true,
            content_address: false,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"objectStore":true,"contentAddress":false}"#);
    }
}
