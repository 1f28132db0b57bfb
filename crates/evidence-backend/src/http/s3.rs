use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{SecondsFormat, Utc};
use reqwest::{Client, Method, Response, StatusCode, Url};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::sigv4::{self, Signer};
use super::status_error;
use crate::config::S3Config;
use crate::error::{BackendError, BackendResult};
use crate::traits::{ObjectData, ObjectLock, ObjectStoreClient};

const META_PREFIX: &str = "x-amz-meta-";

/// Minimal path-style S3 REST client signed with SigV4.
pub struct S3HttpClient {
    http: Client,
    scheme: String,
    host: String,
    base_path: String,
    bucket: String,
    signer: Signer,
}

impl S3HttpClient {
    pub fn new(config: &S3Config) -> BackendResult<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| BackendError::Config(format!("invalid S3 endpoint: {e}")))?;
        let host_name = endpoint
            .host_str()
            .ok_or_else(|| BackendError::Config("S3 endpoint has no host".into()))?;
        let host = match endpoint.port() {
            Some(port) => format!("{host_name}:{port}"),
            None => host_name.to_string(),
        };
        if config.bucket.is_empty() {
            return Err(BackendError::Config("S3 bucket must not be empty".into()));
        }
        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http,
            scheme: endpoint.scheme().to_string(),
            host,
            base_path: endpoint.path().trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            signer: Signer::new(
                &config.access_key_id,
                &config.secret_access_key,
                &config.region,
            ),
        })
    }

    fn object_path(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_path,
            urlencoding::encode(&self.bucket),
            sigv4::encode_path(key)
        )
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}://{}{path}", self.scheme, self.host)
    }

    async fn send(
        &self,
        method: Method,
        key: &str,
        body: Vec<u8>,
        mut headers: BTreeMap<String, String>,
    ) -> BackendResult<Response> {
        let now = Utc::now();
        let path = self.object_path(key);
        let payload_hash = sigv4::sha256_hex(&body);
        headers.insert("host".into(), self.host.clone());
        headers.insert("x-amz-content-sha256".into(), payload_hash.clone());
        headers.insert("x-amz-date".into(), sigv4::amz_date(now));
        let authorization =
            self.signer
                .authorization(method.as_str(), &path, &headers, &payload_hash, now);

        debug!(method = %method, key, bucket = %self.bucket, "s3 request");
        let mut request = self.http.request(method, self.url_for(&path));
        for (name, value) in headers.iter().filter(|(name, _)| name.as_str() != "host") {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request
            .header(reqwest::header::AUTHORIZATION, authorization)
            .body(body)
            .send()
            .await?;
        Ok(response)
    }
}

impl std::fmt::Debug for S3HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3HttpClient")
            .field("host", &self.host)
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ObjectStoreClient for S3HttpClient {
    async fn put(
        &self,
        key: &str,
        data: &[u8],
        attributes: &BTreeMap<String, String>,
        lock: Option<ObjectLock>,
    ) -> BackendResult<()> {
        let mut headers: BTreeMap<String, String> = attributes
            .iter()
            .map(|(name, value)| (format!("{META_PREFIX}{}", name.to_lowercase()), value.clone()))
            .collect();
        headers.insert("content-type".into(), "application/octet-stream".into());
        if let Some(lock) = lock {
            headers.insert("x-amz-object-lock-mode".into(), "COMPLIANCE".into());
            headers.insert(
                "x-amz-object-lock-retain-until-date".into(),
                lock.retain_until.to_rfc3339_opts(SecondsFormat::Secs, true),
            );
            // Object-lock writes must carry an integrity checksum.
            headers.insert(
                "x-amz-checksum-sha256".into(),
                BASE64.encode(Sha256::digest(data)),
            );
        }

        let response = self.send(Method::PUT, key, data.to_vec(), headers).await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> BackendResult<ObjectData> {
        let response = self.send(Method::GET, key, Vec::new(), BTreeMap::new()).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(BackendError::NotFound(key.to_string())),
            status if status.is_success() => {
                let attributes = response
                    .headers()
                    .iter()
                    .filter_map(|(name, value)| {
                        let name = name.as_str().strip_prefix(META_PREFIX)?;
                        let value = value.to_str().ok()?;
                        Some((name.to_string(), value.to_string()))
                    })
                    .collect();
                let data = response.bytes().await?.to_vec();
                Ok(ObjectData { data, attributes })
            }
            _ => Err(status_error(response).await),
        }
    }

    async fn head(&self, key: &str) -> BackendResult<bool> {
        let response = self.send(Method::HEAD, key, Vec::new(), BTreeMap::new()).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(status_error(response).await),
        }
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> BackendResult<String> {
        let path = self.object_path(key);
        let query = self
            .signer
            .presign("GET", &self.host, &path, expires_in.as_secs(), Utc::now());
        Ok(format!("{}?{query}", self.url_for(&path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidence_integrity::IntegrityMetadata;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: String) -> S3Config {
        S3Config {
            endpoint,
            region: "us-east-1".into(),
            access_key_id: "AKIDTEST".into(),
            secret_access_key: "secret".into(),
            bucket: "evidence-bucket".into(),
            object_lock_enabled: false,
            timeout_ms: Some(5_000),
        }
    }

    #[test]
    fn rejects_bad_endpoint() {
        assert!(matches!(
            S3HttpClient::new(&config("not a url".into())),
            Err(BackendError::Config(_))
        ));
    }

    #[test]
    fn object_path_is_path_style() {
        let client = S3HttpClient::new(&config("http://localhost:9000/".into())).unwrap();
        assert_eq!(client.object_path("evidence/abc"), "/evidence-bucket/evidence/abc");
        assert_eq!(client.host, "localhost:9000");
    }

    #[tokio::test]
    async fn put_sends_signed_metadata_headers() {
        let server = MockServer::start().await;
        let meta = IntegrityMetadata::compute(b"hello world");

        Mock::given(method("PUT"))
            .and(path("/evidence-bucket/evidence/abc"))
            .and(header_exists("authorization"))
            .and(header_exists("x-amz-date"))
            .and(header("x-amz-meta-content-hash", meta.hash.as_str()))
            .and(header("x-amz-meta-content-size", "11"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = S3HttpClient::new(&config(server.uri())).unwrap();
        client
            .put("evidence/abc", b"hello world", &meta.to_attributes(), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn put_with_lock_sends_retention_headers() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/evidence-bucket/locked"))
            .and(header("x-amz-object-lock-mode", "COMPLIANCE"))
            .and(header_exists("x-amz-object-lock-retain-until-date"))
            .and(header_exists("x-amz-checksum-sha256"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = S3HttpClient::new(&config(server.uri())).unwrap();
        let lock = ObjectLock {
            retain_until: Utc::now() + chrono::Duration::days(365),
        };
        client
            .put("locked", b"x", &BTreeMap::new(), Some(lock))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn put_failure_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string("AccessDenied"))
            .mount(&server)
            .await;

        let client = S3HttpClient::new(&config(server.uri())).unwrap();
        let err = client
            .put("k", b"x", &BTreeMap::new(), None)
            .await
            .unwrap_err();
        match err {
            BackendError::Http { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("AccessDenied"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_strips_metadata_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/evidence-bucket/k"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-amz-meta-content-hash", "0xabc")
                    .insert_header("x-amz-meta-content-size", "4")
                    .insert_header("x-amz-request-id", "ignored")
                    .set_body_bytes(b"data".to_vec()),
            )
            .mount(&server)
            .await;

        let client = S3HttpClient::new(&config(server.uri())).unwrap();
        let obj = client.get("k").await.unwrap();
        assert_eq!(obj.data, b"data");
        assert_eq!(obj.attributes.get("content-hash").unwrap(), "0xabc");
        assert_eq!(obj.attributes.get("content-size").unwrap(), "4");
        assert_eq!(obj.attributes.len(), 2);
    }

    #[tokio::test]
    async fn get_404_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = S3HttpClient::new(&config(server.uri())).unwrap();
        assert!(client.get("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn head_maps_status() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/evidence-bucket/present"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/evidence-bucket/absent"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = S3HttpClient::new(&config(server.uri())).unwrap();
        assert!(client.head("present").await.unwrap());
        assert!(!client.head("absent").await.unwrap());
    }

    #[tokio::test]
    async fn presigned_url_points_at_object() {
        let client = S3HttpClient::new(&config("https://s3.example.com".into())).unwrap();
        let url = client
            .presign_get("evidence/abc", Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(url.starts_with("https://s3.example.com/evidence-bucket/evidence/abc?"));
        assert!(url.contains("X-Amz-Expires=3600"));
        assert!(url.contains("X-Amz-Signature="));
    }
}
