//! Main client for the Readwise backend.

use crate::api::{HighlightsApi, ReaderApi};
use crate::config::{ApiToken, ClientConfig, RetryPolicy};
use crate::transport::HttpTransport;
use readwise_mcp_core::{GatewayError, GatewayResult};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Host both backend API versions live under.
pub const DEFAULT_BASE_URL: &str = "https://readwise.io";

/// Default page size for full-collection walks; the backend caps
/// `page_size` at 1000.
pub const DEFAULT_FETCH_PAGE_SIZE: u32 = 1000;

/// Main client for interacting with the Readwise APIs.
#[derive(Debug, Clone)]
pub struct ReadwiseClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl ReadwiseClient {
    /// Create a new client builder.
    pub fn builder() -> ReadwiseClientBuilder {
        ReadwiseClientBuilder::new()
    }

    /// Create a client from configuration.
    fn from_config(config: ClientConfig) -> GatewayResult<Self> {
        let config = Arc::new(config);
        let http = HttpTransport::new(config.clone())?;

        Ok(Self { config, http })
    }

    /// Get the Reader (v3) document API.
    pub fn reader(&self) -> ReaderApi<'_> {
        ReaderApi::new(self)
    }

    /// Get the highlights-library (v2) API.
    pub fn highlights(&self) -> HighlightsApi<'_> {
        HighlightsApi::new(self)
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }
}

/// Builder for creating a ReadwiseClient.
pub struct ReadwiseClientBuilder {
    base_url: Option<String>,
    token: Option<ApiToken>,
    timeout: Duration,
    retry: RetryPolicy,
    fetch_page_size: u32,
}

impl ReadwiseClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            fetch_page_size: DEFAULT_FETCH_PAGE_SIZE,
        }
    }

    /// Override the backend host. Tests point this at a local mock.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the backend API token (required).
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(ApiToken::new(token));
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Set the page size used for full-collection walks.
    pub fn fetch_page_size(mut self, size: u32) -> Self {
        self.fetch_page_size = size;
        self
    }

    /// Build the client.
    pub fn build(self) -> GatewayResult<ReadwiseClient> {
        let token = self
            .token
            .ok_or_else(|| GatewayError::InvalidParameters("backend token is required".to_string()))?;
        if token.is_empty() {
            return Err(GatewayError::InvalidParameters(
                "backend token must not be empty".to_string(),
            ));
        }

        let base = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base)
            .map_err(|_| GatewayError::InvalidParameters(format!("invalid base URL '{base}'")))?;

        let config = ClientConfig {
            base_url,
            token,
            timeout: self.timeout,
            retry: self.retry,
            fetch_page_size: self.fetch_page_size,
        };

        ReadwiseClient::from_config(config)
    }
}

impl Default for ReadwiseClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
