//! HTTP transport seam
//!
//! The source hands fully built requests to a [`Transport`] and only looks at
//! status and body of what comes back, so tests and embedders can swap the
//! HTTP stack.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Request, StatusCode};
use std::time::Duration;
use temps_query::{DataError, Result};
use tracing::{debug, error};

/// Status and raw body of an HTTP response
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<TransportResponse>;
}

/// [`Transport`] backed by a shared `reqwest::Client`
pub struct ReqwestTransport {
    client: Client,
    /// Bearer token added to every request
    access_token: Option<String>,
}

impl ReqwestTransport {
    pub fn new(access_token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            access_token,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, mut request: Request) -> Result<TransportResponse> {
        if let Some(token) = &self.access_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| DataError::invalid_configuration("access token is not a valid header value"))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        debug!("Resource Graph request: {} {}", request.method(), request.url());

        let response = self.client.execute(request).await.map_err(|e| {
            error!("Resource Graph request failed: {}", e);
            DataError::RequestFailed(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| DataError::RequestFailed(format!("Failed to read response: {}", e)))?;

        debug!("Resource Graph response: {} ({} bytes)", status, body.len());

        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::create_request;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_sends_bearer_token_and_returns_raw_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/resources"))
            .and(header("Authorization", "Bearer test-access-token"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&mock_server)
            .await;

        let transport = ReqwestTransport::new(Some("test-access-token".to_string())).unwrap();
        let request = create_request(
            &format!("{}/resources", mock_server.uri()),
            b"{}".to_vec(),
            "Temps/test",
        )
        .unwrap();

        let response = transport.send(request).await.unwrap();
        assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.body, Bytes::from_static(b"slow down"));
    }

    #[tokio::test]
    async fn test_connection_failure_is_request_failed() {
        let transport = ReqwestTransport::new(None).unwrap();
        let request = create_request("http://127.0.0.1:1/", vec![], "Temps/test").unwrap();

        assert!(matches!(
            transport.send(request).await,
            Err(DataError::RequestFailed(_))
        ));
    }
}
