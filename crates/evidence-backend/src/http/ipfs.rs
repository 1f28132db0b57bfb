use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use super::error_body;
use crate::config::IpfsConfig;
use crate::error::{BackendError, BackendResult};
use crate::traits::IpfsClient;

/// Client for the Kubo RPC API (`/api/v0`).
pub struct IpfsHttpClient {
    http: Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

#[derive(Debug, Deserialize)]
struct PinLsResponse {
    #[serde(rename = "Keys", default)]
    keys: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "Message")]
    message: String,
}

impl IpfsHttpClient {
    pub fn new(config: &IpfsConfig) -> BackendResult<Self> {
        if config.endpoint.is_empty() {
            return Err(BackendError::Config("IPFS endpoint must not be empty".into()));
        }
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http,
            api_base: format!("{}/api/v0", config.endpoint.trim_end_matches('/')),
        })
    }

    async fn call(&self, command: &str, query: &[(&str, &str)]) -> BackendResult<Response> {
        debug!(command, "ipfs rpc");
        let response = self
            .http
            .post(format!("{}/{command}", self.api_base))
            .query(query)
            .send()
            .await?;
        Ok(response)
    }
}

impl std::fmt::Debug for IpfsHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpfsHttpClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

/// Error message carried in a Kubo error body, falling back to the raw text.
async fn error_message(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = error_body(response).await;
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|e| e.message)
        .unwrap_or(body);
    (status, message)
}

#[async_trait]
impl IpfsClient for IpfsHttpClient {
    async fn add(&self, data: &[u8], pin: bool) -> BackendResult<String> {
        let form = Form::new().part("file", Part::bytes(data.to_vec()).file_name("evidence"));
        let response = self
            .http
            .post(format!("{}/add", self.api_base))
            .query(&[("pin", if pin { "true" } else { "false" })])
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            let (status, body) = error_message(response).await;
            return Err(BackendError::Http { status, body });
        }

        // Progress-less adds answer with one JSON object per line; the last
        // one describes the root.
        let body = response.text().await?;
        let last = body
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| BackendError::InvalidResponse("empty add response".into()))?;
        let parsed: AddResponse = serde_json::from_str(last)
            .map_err(|e| BackendError::InvalidResponse(format!("add response: {e}")))?;
        Ok(parsed.hash)
    }

    async fn cat(&self, address: &str) -> BackendResult<Vec<u8>> {
        let response = self.call("cat", &[("arg", address)]).await?;
        if !response.status().is_success() {
            let (status, message) = error_message(response).await;
            if message.contains("not found") || message.contains("no link named") {
                return Err(BackendError::NotFound(address.to_string()));
            }
            return Err(BackendError::Http {
                status,
                body: message,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn pin_ls(&self, address: &str) -> BackendResult<bool> {
        let response = self
            .call("pin/ls", &[("arg", address), ("type", "recursive")])
            .await?;
        if !response.status().is_success() {
            let (status, message) = error_message(response).await;
            if message.contains("not pinned") {
                return Ok(false);
            }
            return Err(BackendError::Http {
                status,
                body: message,
            });
        }
        let parsed: PinLsResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("pin/ls response: {e}")))?;
        Ok(!parsed.keys.is_empty())
    }
}
