//! AWS Signature Version 4 for S3 requests.
//!
//! Covers header-signed requests and query-signed (presigned) URLs. Only what
//! the object-store client needs: single-chunk payloads, path-style URIs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

const SERVICE: &str = "s3";

/// Request signer bound to one set of credentials and one region.
#[derive(Clone)]
pub struct Signer {
    access_key_id: String,
    secret_access_key: String,
    region: String,
}

impl Signer {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// `Authorization` header value for a header-signed request.
    ///
    /// `headers` must use lowercase names and include `host`,
    /// `x-amz-date` and `x-amz-content-sha256`.
    pub fn authorization(
        &self,
        method: &str,
        canonical_uri: &str,
        headers: &BTreeMap<String, String>,
        payload_hash: &str,
        now: DateTime<Utc>,
    ) -> String {
        let signed_headers = signed_headers(headers);
        let request = canonical_request(method, canonical_uri, "", headers, payload_hash);
        let signature = self.sign(&request, now);
        format!(
            "{ALGORITHM} Credential={}/{}, SignedHeaders={signed_headers}, Signature={signature}",
            self.access_key_id,
            self.scope(now),
        )
    }

    /// Query string (signature included) for a presigned request that only
    /// signs the `host` header.
    pub fn presign(
        &self,
        method: &str,
        host: &str,
        canonical_uri: &str,
        expires_secs: u64,
        now: DateTime<Utc>,
    ) -> String {
        let credential = format!("{}/{}", self.access_key_id, self.scope(now));
        let params = vec![
            ("X-Amz-Algorithm".to_string(), ALGORITHM.to_string()),
            ("X-Amz-Credential".to_string(), credential),
            ("X-Amz-Date".to_string(), amz_date(now)),
            ("X-Amz-Expires".to_string(), expires_secs.to_string()),
            ("X-Amz-SignedHeaders".to_string(), "host".to_string()),
        ];
        let query = canonical_query(&params);
        let headers = BTreeMap::from([("host".to_string(), host.to_string())]);
        let request = canonical_request(method, canonical_uri, &query, &headers, UNSIGNED_PAYLOAD);
        let signature = self.sign(&request, now);
        format!("{query}&X-Amz-Signature={signature}")
    }

    fn scope(&self, now: DateTime<Utc>) -> String {
        format!("{}/{}/{SERVICE}/aws4_request", short_date(now), self.region)
    }

    fn sign(&self, canonical_request: &str, now: DateTime<Utc>) -> String {
        let string_to_sign = format!(
            "{ALGORITHM}\n{}\n{}\n{}",
            amz_date(now),
            self.scope(now),
            sha256_hex(canonical_request.as_bytes())
        );
        let key = signing_key(&self.secret_access_key, &short_date(now), &self.region);
        hex::encode(hmac(&key, string_to_sign.as_bytes()))
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("access_key_id", &self.access_key_id)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// `YYYYMMDD'T'HHMMSS'Z'`
pub fn amz_date(now: DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

fn short_date(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d").to_string()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// URI-encode an object key, keeping `/` separators.
pub fn encode_path(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn canonical_query(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| {
            (
                urlencoding::encode(k).into_owned(),
                urlencoding::encode(v).into_owned(),
            )
        })
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn signed_headers(headers: &BTreeMap<String, String>) -> String {
    headers.keys().cloned().collect::<Vec<_>>().join(";")
}

fn canonical_request(
    method: &str,
    canonical_uri: &str,
    canonical_query: &str,
    headers: &BTreeMap<String, String>,
    payload_hash: &str,
) -> String {
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{name}:{}\n", value.trim()))
        .collect();
    format!(
        "{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n{}\n{payload_hash}",
        signed_headers(headers)
    )
}

fn signing_key(secret: &str, date: &str, region: &str) -> Vec<u8> {
    let k_date = hmac(format!("AWS4{secret}").as_bytes(), date.as_bytes());
    let k_region = hmac(&k_date, region.as_bytes());
    let k_service = hmac(&k_region, SERVICE.as_bytes());
    hmac(&k_service, b"aws4_request")
}

fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
