use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IntegrityError;
use crate::hash::ContentHash;

/// Attribute name carrying the content hash on stored objects.
pub const ATTR_HASH: &str = "content-hash";
/// Attribute name carrying the payload size in bytes.
pub const ATTR_SIZE: &str = "content-size";
/// Attribute name carrying the metadata creation time.
pub const ATTR_TIMESTAMP: &str = "timestamp";

/// Hash, size and creation time of a payload.
///
/// Two computations over identical bytes differ only in `timestamp`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityMetadata {
    pub hash: ContentHash,
    pub size: u64,
    /// ISO-8601 UTC, millisecond precision (`2024-05-01T12:00:00.123Z`).
    pub timestamp: String,
}

impl IntegrityMetadata {
    /// Fingerprint `data`, stamping it with the current time.
    pub fn compute(data: &[u8]) -> Self {
        Self {
            hash: ContentHash::of(data),
            size: data.len() as u64,
            timestamp: now_timestamp(),
        }
    }

    /// Check `data` against the recorded hash and size.
    pub fn check(&self, data: &[u8]) -> Result<(), IntegrityError> {
        let computed = ContentHash::of(data);
        if computed != self.hash {
            return Err(IntegrityError::Violation {
                expected: self.hash.to_string(),
                computed: computed.to_string(),
            });
        }
        if data.len() as u64 != self.size {
            return Err(IntegrityError::Violation {
                expected: format!("{} bytes", self.size),
                computed: format!("{} bytes", data.len()),
            });
        }
        Ok(())
    }

    /// Render as string attributes for object metadata.
    pub fn to_attributes(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (ATTR_HASH.to_string(), self.hash.to_string()),
            (ATTR_SIZE.to_string(), self.size.to_string()),
            (ATTR_TIMESTAMP.to_string(), self.timestamp.clone()),
        ])
    }

    /// Rebuild from string attributes.
    ///
    /// Returns `Ok(None)` when no hash attribute is present at all, i.e. the
    /// object was not written through this crate.
    pub fn from_attributes(
        attributes: &BTreeMap<String, String>,
    ) -> Result<Option<Self>, IntegrityError> {
        let Some(raw_hash) = attributes.get(ATTR_HASH) else {
            return Ok(None);
        };
        let hash = ContentHash::parse(raw_hash)?;
        let size = attributes
            .get(ATTR_SIZE)
            .ok_or(IntegrityError::MissingAttribute(ATTR_SIZE))?
            .parse::<u64>()
            .map_err(|e| IntegrityError::InvalidAttribute {
                name: ATTR_SIZE,
                reason: e.to_string(),
            })?;
        let timestamp = attributes
            .get(ATTR_TIMESTAMP)
            .ok_or(IntegrityError::MissingAttribute(ATTR_TIMESTAMP))?
            .clone();
        Ok(Some(Self {
            hash,
            size,
            timestamp,
        }))
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
