//! HTTP transport layer for the Readwise client.

use crate::config::ClientConfig;
use readwise_mcp_core::{GatewayError, GatewayResult};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP transport for making backend API requests.
///
/// Carries the backend token as a default Authorization header (marked
/// sensitive so tracing layers redact it) and applies the configured
/// retry policy to every request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> GatewayResult<Self> {
        let mut headers = header::HeaderMap::new();

        let mut auth = header::HeaderValue::from_str(&config.token.header_value()).map_err(|_| {
            GatewayError::InvalidParameters(
                "backend token contains characters not allowed in a header".to_string(),
            )
        })?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|_| {
                GatewayError::InvalidParameters("failed to initialize HTTP client".to_string())
            })?;

        Ok(Self { client, config })
    }

    /// Build a URL for the given path.
    fn build_url(&self, path: &str) -> GatewayResult<url::Url> {
        self.config
            .base_url
            .join(path)
            .map_err(|_| GatewayError::InvalidParameters(format!("invalid request path '{path}'")))
    }

    /// Execute a request with retries.
    ///
    /// Only statuses in the retry policy and transient send failures are
    /// retried; a 429's Retry-After header overrides the computed backoff.
    async fn execute_with_retry(&self, request_builder: RequestBuilder) -> GatewayResult<Response> {
        let retry = &self.config.retry;
        let mut attempts = 0;

        loop {
            let request = request_builder.try_clone().ok_or_else(|| {
                GatewayError::InvalidParameters("request cannot be cloned for retry".to_string())
            })?;

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if response.status().is_success() {
                        return Ok(response);
                    }

                    let retry_after = retry_after_secs(&response);

                    if attempts < retry.max_retries && retry.should_retry_status(status) {
                        let backoff = retry_after
                            .map(Duration::from_secs)
                            .unwrap_or_else(|| retry.backoff_for_attempt(attempts));
                        warn!(
                            status = status,
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            "request failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }

                    let body = response.text().await.unwrap_or_default();
                    if !body.is_empty() {
                        debug!(status = status, body = %body, "backend error response");
                    }
                    return Err(GatewayError::from_status(status, retry_after));
                }
                Err(e) => {
                    if attempts < retry.max_retries && (e.is_timeout() || e.is_connect()) {
                        let backoff = retry.backoff_for_attempt(attempts);
                        warn!(
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            "request send failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }
                    return Err(translate_send_error(&e));
                }
            }
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> GatewayResult<T> {
        response.json().await.map_err(|e| {
            debug!(error = %e, "failed to decode backend response");
            GatewayError::BackendUnavailable(
                "backend returned an unreadable response body".to_string(),
            )
        })
    }

    /// Execute a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request");

        let response = self.execute_with_retry(self.client.get(url)).await?;
        Self::parse_json(response).await
    }

    /// Execute a GET request with query parameters.
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> GatewayResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request with query");

        let response = self
            .execute_with_retry(self.client.get(url).query(query))
            .await?;
        Self::parse_json(response).await
    }

    /// Execute a POST request.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> GatewayResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "POST request");

        let response = self
            .execute_with_retry(self.client.post(url).json(body))
            .await?;
        Self::parse_json(response).await
    }

    /// Execute a PATCH request.
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> GatewayResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "PATCH request");

        let response = self
            .execute_with_retry(self.client.patch(url).json(body))
            .await?;
        Self::parse_json(response).await
    }

    /// Execute a DELETE request. A success with an empty body parses as `{}`.
    pub async fn delete(&self, path: &str) -> GatewayResult<Value> {
        let url = self.build_url(path)?;
        debug!(url = %url, "DELETE request");

        let response = self.execute_with_retry(self.client.delete(url)).await?;
        let body = response.text().await.unwrap_or_default();
        if body.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        serde_json::from_str(&body).map_err(|_| {
            GatewayError::BackendUnavailable(
                "backend returned an unreadable response body".to_string(),
            )
        })
    }
}

fn retry_after_secs(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

fn translate_send_error(err: &reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::BackendUnavailable("request timed out".to_string())
    } else if err.is_connect() {
        GatewayError::BackendUnavailable("connection to backend failed".to_string())
    } else {
        GatewayError::BackendUnavailable("request failed before a response arrived".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiToken, RetryPolicy};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_config(base_url: &str, retry: RetryPolicy) -> Arc<ClientConfig> {
        Arc::new(ClientConfig {
            base_url: url::Url::parse(base_url).unwrap(),
            token: ApiToken::new("rw-test-token"),
            timeout: Duration::from_secs(5),
            retry,
            fetch_page_size: 1000,
        })
    }

    #[tokio::test]
    async fn test_token_scheme_header_attached() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/auth"))
            .and(header("Authorization", "Token rw-test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "ok"})))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri(), RetryPolicy::no_retry()))
            .unwrap();

        let result: Value = transport.get("/api/v2/auth").await.unwrap();
        assert_eq!(result["detail"], "ok");
    }

    #[tokio::test]
    async fn test_rate_limit_retries_after_hinted_delay() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/highlights"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/highlights"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 0, "next": null, "previous": null, "results": []
            })))
            .mount(&server)
            .await;

        let retry = RetryPolicy {
            max_retries: 1,
            initial_backoff: Duration::from_millis(10),
            ..Default::default()
        };
        let transport = HttpTransport::new(create_config(&server.uri(), retry)).unwrap();

        let result: Value = transport.get("/api/v2/highlights").await.unwrap();
        assert_eq!(result["count"], 0);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_no_retry_surfaces_rate_limit_with_hint() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/highlights"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri(), RetryPolicy::no_retry()))
            .unwrap();

        let err = transport.get::<Value>("/api/v2/highlights").await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::BackendRateLimited {
                retry_after_secs: Some(7)
            }
        );
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/list"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "missing"})))
            .mount(&server)
            .await;

        // A retry-happy policy must still fail fast on a 404.
        let transport =
            HttpTransport::new(create_config(&server.uri(), RetryPolicy::default())).unwrap();

        let err = transport.get::<Value>("/api/v3/list").await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::BackendRejected { status: 404, .. }
        ));
        assert!(!err.is_retryable());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_server_errors_retried_until_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/books"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/books"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1, "next": null, "previous": null,
                "results": [{"id": 3, "title": "Recovered"}]
            })))
            .mount(&server)
            .await;

        let retry = RetryPolicy {
            max_retries: 2,
            initial_backoff: Duration::from_millis(5),
            ..Default::default()
        };
        let transport = HttpTransport::new(create_config(&server.uri(), retry)).unwrap();

        let result: Value = transport.get("/api/v2/books").await.unwrap();
        assert_eq!(result["results"][0]["title"], "Recovered");
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_retry_budget_exhaustion_surfaces_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/books"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let retry = RetryPolicy {
            max_retries: 1,
            initial_backoff: Duration::from_millis(5),
            ..Default::default()
        };
        let transport = HttpTransport::new(create_config(&server.uri(), retry)).unwrap();

        let err = transport.get::<Value>("/api/v2/books").await.unwrap_err();
        assert!(matches!(err, GatewayError::BackendUnavailable(_)));
        assert!(err.is_retryable());
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_body_maps_to_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/review"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri(), RetryPolicy::no_retry()))
            .unwrap();

        let err = transport.get::<Value>("/api/v2/review").await.unwrap_err();
        assert!(matches!(err, GatewayError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_delete_tolerates_empty_body() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/v3/documents/doc1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri(), RetryPolicy::no_retry()))
            .unwrap();

        let result = transport.delete("/api/v3/documents/doc1").await.unwrap();
        assert_eq!(result, json!({}));
    }
}
