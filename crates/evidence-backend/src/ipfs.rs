use async_trait::async_trait;
use evidence_integrity::IntegrityMetadata;
use tracing::debug;

use crate::config::DEFAULT_GATEWAY;
use crate::error::BackendResult;
use crate::traits::{ContentBackend, IpfsClient, RetrievedObject};

/// Content-addressed adapter over an IPFS node. Every write is pinned.
pub struct IpfsBackend<C> {
    client: C,
    gateway: String,
}

impl<C: IpfsClient> IpfsBackend<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            gateway: DEFAULT_GATEWAY.to_string(),
        }
    }

    /// Gateway used by [`ContentBackend::gateway_url`] when the caller
    /// passes none.
    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = gateway.into();
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

/// `${gateway}/ipfs/${address}`, tolerating a trailing slash on the base.
pub fn gateway_url(gateway: &str, address: &str) -> String {
    format!("{}/ipfs/{address}", gateway.trim_end_matches('/'))
}

#[async_trait]
impl<C: IpfsClient> ContentBackend for IpfsBackend<C> {
    async fn store(&self, data: &[u8]) -> BackendResult<String> {
        let address = self.client.add(data, true).await?;
        debug!(%address, size = data.len(), "ipfs add");
        Ok(address)
    }

    async fn retrieve(&self, address: &str) -> BackendResult<RetrievedObject> {
        let data = self.client.cat(address).await?;
        // The address already commits to the content; metadata is derived
        // from what the node returned.
        let metadata = IntegrityMetadata::compute(&data);
        Ok(RetrievedObject { data, metadata })
    }

    async fn exists(&self, address: &str) -> BackendResult<bool> {
        self.client.pin_ls(address).await
    }

    fn gateway_url(&self, address: &str, gateway: Option<&str>) -> String {
        gateway_url(gateway.unwrap_or(&self.gateway), address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryIpfsClient;

    fn backend() -> IpfsBackend<InMemoryIpfsClient> {
        IpfsBackend::new(InMemoryIpfsClient::new())
    }

    #[tokio::test]
    async fn store_pins_content() {
        let backend = backend();
        let address = backend.store(b"pinned").await.unwrap();
        assert!(backend.client().pin_ls(&address).await.unwrap());
        assert!(backend.exists(&address).await.unwrap());
    }

    #[tokio::test]
    async fn retrieve_computes_metadata() {
        let backend = backend();
        let address = backend.store(b"hello world").await.unwrap();
        let got = backend.retrieve(&address).await.unwrap();
        assert_eq!(got.data, b"hello world");
        assert_eq!(
            got.metadata.hash.as_str(),
            "0xb94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(got.metadata.size, 11);
    }

    #[tokio::test]
    async fn retrieve_missing_is_not_found() {
        assert!(backend().retrieve("mem-absent").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn unpinned_content_does_not_exist() {
        let backend = backend();
        let address = backend.store(b"x").await.unwrap();
        backend.client().unpin(&address);
        assert!(!backend.exists(&address).await.unwrap());
    }

    #[test]
    fn gateway_url_default() {
        assert_eq!(
            backend().gateway_url("bafyabc", None),
            "https://ipfs.io/ipfs/bafyabc"
        );
    }

    #[test]
    fn gateway_url_override_trims_slash() {
        assert_eq!(
            backend().gateway_url("bafyabc", Some("https://dweb.link/")),
            "https://dweb.link/ipfs/bafyabc"
        );
        let custom = backend().with_gateway("http://localhost:8080");
        assert_eq!(
            custom.gateway_url("bafyabc", None),
            "http://localhost:8080/ipfs/bafyabc"
        );
    }
}
