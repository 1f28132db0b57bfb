use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::IntegrityError;

/// Marker prepended to every rendered digest.
pub const HASH_PREFIX: &str = "0x";

const HEX_LEN: usize = 64;

/// SHA-256 digest of a payload, rendered as `0x` + 64 lowercase hex chars.
///
/// Identical bytes always produce the same `ContentHash`, no matter which
/// backend ends up holding them.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash raw bytes.
    pub fn of(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Self(format!("{HASH_PREFIX}{}", hex::encode(digest)))
    }

    /// Parse a rendered hash, rejecting anything `of` could not have produced.
    pub fn parse(s: &str) -> Result<Self, IntegrityError> {
        let invalid = |reason: &str| IntegrityError::InvalidHash {
            value: s.to_string(),
            reason: reason.to_string(),
        };
        let hex_part = s
            .strip_prefix(HASH_PREFIX)
            .ok_or_else(|| invalid("missing 0x prefix"))?;
        if hex_part.len() != HEX_LEN {
            return Err(invalid("expected 64 hex characters"));
        }
        if !hex_part
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(invalid("expected lowercase hex"));
        }
        Ok(Self(s.to_string()))
    }

    /// The full rendered form, including the prefix.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hex digest without the `0x` marker.
    pub fn hex_digest(&self) -> &str {
        &self.0[HASH_PREFIX.len()..]
    }

    /// Short form for log lines (first 8 hex characters).
    pub fn short(&self) -> &str {
        &self.hex_digest()[..8]
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = IntegrityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl PartialEq<str> for ContentHash {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ContentHash {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Hash a payload.
pub fn digest(data: &[u8]) -> ContentHash {
    ContentHash::of(data)
}

/// Check `data` against a rendered hash.
///
/// Exact, case-sensitive comparison. Malformed input simply does not match.
pub fn verify(data: &[u8], expected: &str) -> bool {
    digest(data) == expected
}
