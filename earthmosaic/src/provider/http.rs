//! HTTP client abstraction for testability

use std::sync::Arc;
use std::time::Duration;

use super::types::ProviderError;

/// Browser-like client identity; the imagery endpoint throttles unknown agents harder.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError>;
}

/// Shared clients, so one client can serve several fetchers.
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        (**self).get(url)
    }
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with the default timeout and user agent.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_settings(Duration::from_secs(DEFAULT_TIMEOUT_SECS), DEFAULT_USER_AGENT)
    }

    /// Creates a new ReqwestClient with custom timeout and user agent.
    pub fn with_settings(timeout: Duration, user_agent: &str) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                ProviderError::HttpError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ProviderError::HttpError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| ProviderError::HttpError(format!("Failed to read response: {}", e)))
    }
}
