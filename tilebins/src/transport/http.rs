//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::TransportError;
use crate::config::DEFAULT_TIMEOUT_SECS;

const USER_AGENT: &str = concat!("tilebins/", env!("CARGO_PKG_VERSION"));

/// Trait for asynchronous HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// Async HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a client with the default timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| TransportError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        trace!(url = url, "HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(TransportError::Http(format!("Request failed: {}", e)));
            }
        };

        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| TransportError::Http(format!("Failed to read response: {}", e)))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use parking_lot::Mutex;

    /// Mock async HTTP client serving canned bodies by URL path.
    ///
    /// Lookups ignore the query string. Unknown paths answer 404.
    #[derive(Clone, Default)]
    pub struct MockAsyncHttpClient {
        responses: Arc<Mutex<HashMap<String, Result<Vec<u8>, u16>>>>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl MockAsyncHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        /// Serves `body` for `path`.
        pub fn respond(&self, path: &str, body: impl Into<Vec<u8>>) {
            self.responses
                .lock()
                .insert(path.to_string(), Ok(body.into()));
        }

        /// Answers `path` with an HTTP error status.
        pub fn fail(&self, path: &str, status: u16) {
            self.responses.lock().insert(path.to_string(), Err(status));
        }

        /// Every URL requested so far, in order.
        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().clone()
        }
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
            self.requests.lock().push(url.to_string());

            let path = url.split('?').next().unwrap_or(url);
            let response = self.responses.lock().get(path).cloned();
            match response {
                Some(Ok(body)) => Ok(body),
                Some(Err(status)) => Err(TransportError::Status {
                    status,
                    url: url.to_string(),
                }),
                None => Err(TransportError::Status {
                    status: 404,
                    url: url.to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_mock_client_success() {
        let mock = MockAsyncHttpClient::new();
        mock.respond("http://example.com/a.json", vec![1, 2, 3]);

        let body = mock.get("http://example.com/a.json?minx=0").await.unwrap();
        assert_eq!(body, vec![1, 2, 3]);
        assert_eq!(mock.requests(), vec!["http://example.com/a.json?minx=0"]);
    }

    #[tokio::test]
    async fn test_mock_client_error() {
        let mock = MockAsyncHttpClient::new();
        mock.fail("http://example.com/b.json", 500);

        let result = mock.get("http://example.com/b.json").await;
        assert!(matches!(
            result,
            Err(TransportError::Status { status: 500, .. })
        ));

        let missing = mock.get("http://example.com/c.json").await;
        assert!(matches!(
            missing,
            Err(TransportError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(AsyncReqwestClient::with_timeout(5).is_ok());
    }
}
