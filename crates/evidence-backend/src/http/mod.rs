//! HTTP clients for the real backends.

pub mod ipfs;
pub mod s3;
pub mod sigv4;

pub use ipfs::IpfsHttpClient;
pub use s3::S3HttpClient;

use reqwest::Response;
use tracing::debug;

use crate::error::BackendError;

/// Body of an error response. A body that cannot be read is logged and
/// treated as empty so the status still reaches the caller.
pub(crate) async fn error_body(response: Response) -> String {
    let status = response.status().as_u16();
    match response.text().await {
        Ok(body) => body,
        Err(err) => {
            debug!(status, error = %err, "failed to read error response body");
            String::new()
        }
    }
}

/// Turn a non-success response into `BackendError::Http`.
pub(crate) async fn status_error(response: Response) -> BackendError {
    let status = response.status().as_u16();
    let body = error_body(response).await;
    BackendError::Http { status, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn respond_with(template: ResponseTemplate) -> Response {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(template)
            .mount(&server)
            .await;
        reqwest::get(server.uri()).await.unwrap()
    }

    #[tokio::test]
    async fn status_error_keeps_status_and_body() {
        let response = respond_with(ResponseTemplate::new(503).set_body_string("slow down")).await;
        match status_error(response).await {
            BackendError::Http { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "slow down");
            }
            other => panic!("expected Http, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_error_body_is_empty_string() {
        let response = respond_with(ResponseTemplate::new(500)).await;
        assert_eq!(error_body(response).await, "");
    }
}
