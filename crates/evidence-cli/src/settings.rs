use std::path::Path;

use anyhow::{bail, Context};
use evidence_store::{EvidenceStoreConfig, IpfsConfig, S3Config};

pub const ENV_S3_ENDPOINT: &str = "EVIDENCE_S3_ENDPOINT";
pub const ENV_S3_REGION: &str = "EVIDENCE_S3_REGION";
pub const ENV_S3_ACCESS_KEY_ID: &str = "EVIDENCE_S3_ACCESS_KEY_ID";
pub const ENV_S3_SECRET_ACCESS_KEY: &str = "EVIDENCE_S3_SECRET_ACCESS_KEY";
pub const ENV_S3_BUCKET: &str = "EVIDENCE_S3_BUCKET";
pub const ENV_S3_OBJECT_LOCK: &str = "EVIDENCE_S3_OBJECT_LOCK";
pub const ENV_IPFS_ENDPOINT: &str = "EVIDENCE_IPFS_ENDPOINT";
pub const ENV_IPFS_TIMEOUT_MS: &str = "EVIDENCE_IPFS_TIMEOUT_MS";
pub const ENV_IPFS_GATEWAY: &str = "EVIDENCE_IPFS_GATEWAY";

const DEFAULT_REGION: &str = "us-east-1";

/// Resolve configuration once at startup: the file if given, else the
/// process environment.
pub fn load(path: Option<&Path>) -> anyhow::Result<EvidenceStoreConfig> {
    match path {
        Some(path) => EvidenceStoreConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => from_env(|name| std::env::var(name).ok()),
    }
}

/// Build configuration from environment-style lookups.
///
/// The S3 section exists only when endpoint, bucket and both credentials are
/// set; the IPFS section only when its endpoint is set.
pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<EvidenceStoreConfig> {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let s3 = match (
        get(ENV_S3_ENDPOINT),
        get(ENV_S3_BUCKET),
        get(ENV_S3_ACCESS_KEY_ID),
        get(ENV_S3_SECRET_ACCESS_KEY),
    ) {
        (Some(endpoint), Some(bucket), Some(access_key_id), Some(secret_access_key)) => {
            Some(S3Config {
                endpoint,
                region: get(ENV_S3_REGION).unwrap_or_else(|| DEFAULT_REGION.to_string()),
                access_key_id,
                secret_access_key,
                bucket,
                object_lock_enabled: match get(ENV_S3_OBJECT_LOCK) {
                    Some(raw) => parse_flag(ENV_S3_OBJECT_LOCK, &raw)?,
                    None => false,
                },
                timeout_ms: None,
            })
        }
        _ => None,
    };

    let ipfs = match get(ENV_IPFS_ENDPOINT) {
        Some(endpoint) => {
            let timeout_ms = get(ENV_IPFS_TIMEOUT_MS)
                .map(|raw| {
                    raw.parse::<u64>().with_context(|| {
                        format!("{ENV_IPFS_TIMEOUT_MS} must be milliseconds, got {raw:?}")
                    })
                })
                .transpose()?;
            Some(IpfsConfig {
                endpoint,
                timeout_ms,
                gateway: get(ENV_IPFS_GATEWAY),
            })
        }
        None => None,
    };

    Ok(EvidenceStoreConfig { s3, ipfs })
}

fn parse_flag(name: &str, raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{name} must be a boolean, got {raw:?}"),
    }
}
