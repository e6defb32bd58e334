//! HTTP Backend Implementation
//!
//! Adapter for memory services that expose a small JSON-over-HTTP surface:
//!
//! - `POST {base_url}/store` - persist the payload, returns a JSON receipt
//! - `POST {base_url}/retrieve` - run the payload as a query, returns JSON
//!
//! The payload is sent as-is. Non-2xx statuses become
//! [`AdapterError::Rejected`]; bodies that are not JSON become
//! [`AdapterError::Malformed`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::traits::{AdapterError, MemoryBackend, Operation};

/// JSON-over-HTTP memory backend client
#[derive(Clone, Debug)]
pub struct HttpBackend {
    /// Base URL without trailing slash
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpBackend {
    /// Create a new HTTP backend for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http_client: reqwest::Client::new(),
        }
    }

    /// Base URL this adapter talks to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint URL for an operation
    fn endpoint(&self, operation: Operation) -> String {
        format!("{}/{}", self.base_url, operation.as_str())
    }
}

fn classify_transport_error(err: &reqwest::Error, timeout: Duration) -> AdapterError {
    if err.is_timeout() {
        AdapterError::Timeout(timeout)
    } else if err.is_connect() {
        AdapterError::Unavailable(err.to_string())
    } else {
        AdapterError::Transport(err.to_string())
    }
}

#[async_trait]
impl MemoryBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn invoke(
        &self,
        operation: Operation,
        payload: &Value,
        timeout: Duration,
    ) -> Result<Value, AdapterError> {
        let url = self.endpoint(operation);

        let response = self
            .http_client
            .post(&url)
            .json(payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e, timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(&e, timeout))?;

        if !status.is_success() {
            return Err(AdapterError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| AdapterError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:8080/");
        assert_eq!(backend.base_url(), "http://localhost:8080");
        assert_eq!(
            backend.endpoint(Operation::Store),
            "http://localhost:8080/store"
        );
        assert_eq!(
            backend.endpoint(Operation::Retrieve),
            "http://localhost:8080/retrieve"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_an_error() {
        // Port 9 (discard) is not expected to speak HTTP on loopback
        let backend = HttpBackend::new("http://127.0.0.1:9");
        let result = backend
            .invoke(
                Operation::Retrieve,
                &serde_json::json!({"q": "x"}),
                Duration::from_millis(500),
            )
            .await;
        assert!(result.is_err());
    }
}
