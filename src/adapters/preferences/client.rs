//! HTTP client for the preference query service
//!
//! [`PreferenceStore`] is the seam between the retrieval engine and the
//! remote service; [`PreferenceClient`] is the reqwest-backed production
//! implementation. Tests drive the engine through in-memory stores.

use super::models::{QueryPage, QueryRequest};
use crate::config::ApiConfig;
use crate::domain::{HarvestError, PreferenceApiError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;

/// Remote query boundary used by the retrieval engine
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Issue one preference query and decode one page
    async fn query(&self, partition: &str, request: &QueryRequest) -> Result<QueryPage>;
}

/// Authenticated client for the preference service
pub struct PreferenceClient {
    base_url: String,
    client: Client,
    api_token: Option<String>,
}

impl PreferenceClient {
    /// Create a new client from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut client_builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));

        if !config.tls_verify {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder.build().map_err(|e| {
            HarvestError::Configuration(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            api_token: config
                .api_token
                .as_ref()
                .map(|t| t.expose_secret().as_ref().to_string()),
        })
    }

    /// Base URL of the preference service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Verify the service is reachable and answering queries
    ///
    /// Issues a minimal unbounded limit-1 query against the partition.
    pub async fn health_check(&self, partition: &str) -> Result<()> {
        match self.query(partition, &QueryRequest::new(1, None, None)).await {
            Ok(_) => {
                tracing::info!(
                    base_url = %self.base_url,
                    partition = partition,
                    "Preference service health check passed"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    base_url = %self.base_url,
                    partition = partition,
                    error = %e,
                    "Preference service health check failed"
                );
                Err(e)
            }
        }
    }

    fn map_transport_error(e: reqwest::Error) -> PreferenceApiError {
        if e.is_timeout() {
            PreferenceApiError::Timeout(e.to_string())
        } else {
            PreferenceApiError::ConnectionFailed(e.to_string())
        }
    }
}

#[async_trait]
impl PreferenceStore for PreferenceClient {
    async fn query(&self, partition: &str, request: &QueryRequest) -> Result<QueryPage> {
        let url = format!("{}/v1/preferences/{}/query", self.base_url, partition);

        let mut http_request = self.client.post(&url).json(request);
        if let Some(ref token) = self.api_token {
            http_request = http_request.header("Authorization", format!("Bearer {token}"));
        }

        let resp = http_request
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        match resp.status() {
            StatusCode::OK => {
                // A response that fails to decode is fatal; retrying
                // cannot fix a shape mismatch.
                let page = resp
                    .json::<QueryPage>()
                    .await
                    .map_err(|e| PreferenceApiError::InvalidResponse(e.to_string()))?;

                tracing::trace!(
                    partition = partition,
                    nodes = page.nodes.len(),
                    has_cursor = page.cursor.is_some(),
                    "Preference query page received"
                );
                Ok(page)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let body = resp.text().await.unwrap_or_default();
                Err(PreferenceApiError::RateLimited(format!(
                    "Too many requests: {body}"
                ))
                .into())
            }
            status => {
                let reason = status.canonical_reason().unwrap_or("Unknown request error");
                let body = resp.text().await.unwrap_or_default();
                Err(PreferenceApiError::QueryFailed {
                    status: status.as_u16(),
                    message: format!("{reason}: {body}"),
                }
                .into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn test_config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            api_token: Some(secret_string("tok-test".to_string())),
            timeout_seconds: 5,
            tls_verify: true,
            retry: Default::default(),
        }
    }

    #[test]
    fn test_client_strips_trailing_slash() {
        let client = PreferenceClient::new(&test_config("https://consent.example.com/")).unwrap();
        assert_eq!(client.base_url(), "https://consent.example.com");
    }

    #[tokio::test]
    async fn test_query_decodes_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/preferences/acme/query")
            .match_header("authorization", "Bearer tok-test")
            .with_status(200)
            .with_body(
                r#"{"nodes": [{"timestamp": "2025-01-01T10:15:00Z", "userId": "u1"}], "cursor": "next"}"#,
            )
            .create_async()
            .await;

        let client = PreferenceClient::new(&test_config(&server.url())).unwrap();
        let page = client
            .query("acme", &QueryRequest::new(10, None, None))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.nodes.len(), 1);
        assert_eq!(page.cursor.as_deref(), Some("next"));
    }

    #[tokio::test]
    async fn test_query_maps_server_error_with_reason() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/preferences/acme/query")
            .with_status(502)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let client = PreferenceClient::new(&test_config(&server.url())).unwrap();
        let err = client
            .query("acme", &QueryRequest::new(10, None, None))
            .await
            .unwrap_err();

        match err {
            HarvestError::Api(PreferenceApiError::QueryFailed { status, message }) => {
                assert_eq!(status, 502);
                assert!(message.contains("Bad Gateway"));
            }
            other => panic!("Expected QueryFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_query_malformed_body_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/preferences/acme/query")
            .with_status(200)
            .with_body(r#"{"nodes": "not-an-array"}"#)
            .create_async()
            .await;

        let client = PreferenceClient::new(&test_config(&server.url())).unwrap();
        let err = client
            .query("acme", &QueryRequest::new(10, None, None))
            .await
            .unwrap_err();

        assert!(err.is_decode_error());
    }
}
