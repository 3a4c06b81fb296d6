use reqwest::{Client, Request, Response};
use std::time::Duration;

use crate::error::{Result, VolvoError};

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// HTTP transport for the Volvo Cars API.
/// Requests are sent once; retry policy belongs to the caller.
#[derive(Clone)]
pub struct VolvoHttpClient {
    /// Shared HTTP client with connection pooling
    client: Client,
}

impl VolvoHttpClient {
    /// Create a new HTTP client
    pub fn new(max_connections: usize, connect_timeout: u64, request_timeout: u64) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(max_connections)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .map_err(|e| {
                VolvoError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    /// Wrap a caller supplied client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Execute a request. `display_url` is what gets logged (VIN redacted).
    pub async fn execute(
        &self,
        request: Request,
        operation: &str,
        display_url: &str,
    ) -> Result<Response> {
        let method = request.method().clone();
        tracing::debug!(
            method = %method,
            url = %display_url,
            "Request [{}]",
            operation
        );

        match self.client.execute(request).await {
            Ok(response) => {
                tracing::debug!(
                    status = %response.status(),
                    "Request [{}] status",
                    operation
                );
                Ok(response)
            }
            Err(e) => {
                let error_kind = error_kind(&e);

                tracing::warn!(
                    error_kind = error_kind,
                    error = %e,
                    url = %display_url,
                    "Request [{}] error",
                    operation
                );

                Err(VolvoError::Api {
                    operation: operation.to_string(),
                    status: None,
                    message: format!("HTTP request failed (kind: {})", error_kind),
                })
            }
        }
    }

    /// Get the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Categorize a transport error for logging
fn error_kind(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection_failed"
    } else if e.is_request() {
        "request_error"
    } else if e.is_body() {
        "body_error"
    } else if e.is_decode() {
        "decode_error"
    } else {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_execute_returns_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/ping")
            .with_status(204)
            .create_async()
            .await;

        let http = VolvoHttpClient::new(4, 5, DEFAULT_REQUEST_TIMEOUT).unwrap();
        let url = format!("{}/ping", server.url());
        let request = http.client().get(&url).build().unwrap();

        let response = http.execute(request, "ping", &url).await.unwrap();
        assert_eq!(response.status().as_u16(), 204);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connection_failure_maps_to_api_error() {
        let http = VolvoHttpClient::from_client(Client::new());
        let request = http.client().get("http://127.0.0.1:1/").build().unwrap();

        let err = http
            .execute(request, "ping", "http://127.0.0.1:1/")
            .await
            .unwrap_err();

        match err {
            VolvoError::Api {
                operation, status, ..
            } => {
                assert_eq!(operation, "ping");
                assert_eq!(status, None);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
