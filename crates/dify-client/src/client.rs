//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use dify_config::DifyConfig;
use dify_sse::StreamConfig;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;
use url::Url;

use crate::api::WorkflowApi;
use crate::error::{Error, ErrorResponse, Result};

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time to wait for a streaming response to start.
const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(600);

/// Dify API client.
///
/// Cheap to clone; clones share one connection pool.
///
/// # Example
///
/// ```no_run
/// use dify_client::{DifyClient, RunRequest};
///
/// # async fn example() -> dify_client::Result<()> {
/// let client = DifyClient::builder()
///     .base_url("https://api.dify.ai/v1")
///     .api_key("app-...")
///     .build()?;
///
/// let run = client.workflow().run(RunRequest::new("abc-123")).await?;
/// println!("{}", run.data.status);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DifyClient {
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    /// HTTP client.
    pub(crate) http: reqwest::Client,
    /// Base URL for API requests, always ending in `/`.
    pub(crate) base_url: Url,
    /// Request timeout.
    pub(crate) timeout: Duration,
    /// Deadline for a streaming response's headers. The body is unbounded.
    pub(crate) stream_timeout: Duration,
    /// Settings for SSE responses.
    pub(crate) stream_config: StreamConfig,
}

impl DifyClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client from loaded configuration.
    pub fn from_config(config: &DifyConfig) -> Result<Self> {
        let mut builder = Self::builder().stream_config(config.stream_config());
        if let Some(ref url) = config.base_url {
            builder = builder.base_url(url);
        }
        if let Some(ref key) = config.api_key {
            builder = builder.api_key(key);
        }
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.stream_timeout() {
            builder = builder.stream_timeout(timeout);
        }
        builder.build()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Settings applied to streaming responses.
    pub fn stream_config(&self) -> &StreamConfig {
        &self.inner.stream_config
    }

    /// Access the workflow API.
    pub fn workflow(&self) -> WorkflowApi {
        WorkflowApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a URL for an API path.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.inner.base_url.join(path).map_err(Error::from)
    }

    /// Make a GET request.
    pub(crate) async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        debug!(%url, "GET");
        let response = self
            .inner
            .http
            .get(url)
            .timeout(self.inner.timeout)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Make a POST request.
    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = self.url(path)?;
        debug!(%url, "POST");
        let response = self
            .inner
            .http
            .post(url)
            .json(body)
            .timeout(self.inner.timeout)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Make a POST request for streaming.
    ///
    /// The response is returned whatever its status; the stream checks it.
    /// Only the wait for the response headers is bounded by the stream
    /// timeout. Once the body starts, it is read for as long as the server
    /// keeps it open.
    pub(crate) async fn post_stream<B>(&self, path: &str, body: &B) -> Result<reqwest::Response>
    where
        B: serde::Serialize + ?Sized,
    {
        let url = self.url(path)?;
        debug!(%url, "POST (stream)");
        let send = self
            .inner
            .http
            .post(url)
            .header(ACCEPT, "text/event-stream")
            .json(body)
            .send();
        let response = tokio::time::timeout(self.inner.stream_timeout, send)
            .await
            .map_err(|_| Error::Timeout(self.inner.stream_timeout))??;
        Ok(response)
    }

    /// Handle a response, extracting the body or error.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status().is_success() {
            let bytes = response.bytes().await?;
            Ok(serde_json::from_slice(&bytes)?)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Extract an error from a failed response.
    async fn extract_error(&self, response: reqwest::Response) -> Error {
        let status = response.status().as_u16();

        match response.json::<ErrorResponse>().await {
            Ok(err) => {
                if status == 404 {
                    Error::NotFound(err.message)
                } else if status == 401 {
                    Error::Auth(err.message)
                } else {
                    Error::Api {
                        status,
                        code: if err.code.is_empty() {
                            "unknown".to_string()
                        } else {
                            err.code
                        },
                        message: err.message,
                    }
                }
            }
            Err(_) => Error::Api {
                status,
                code: "unknown".to_string(),
                message: format!("HTTP {}", status),
            },
        }
    }
}

/// Builder for creating a DifyClient.
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
    stream_timeout: Duration,
    stream_config: StreamConfig,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
            stream_config: StreamConfig::default(),
            user_agent: None,
        }
    }

    /// Set the API base URL, e.g. `https://api.dify.ai/v1`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the application API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how long a streaming run may take to return its response
    /// headers. It does not limit how long the event stream itself runs.
    pub fn stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    /// Set the settings for SSE responses.
    pub fn stream_config(mut self, config: StreamConfig) -> Self {
        self.stream_config = config;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<DifyClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;

        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(key) = &self.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|_| Error::Config("Invalid API key".to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("dify-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        Ok(DifyClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                timeout: self.timeout,
                stream_timeout: self.stream_timeout,
                stream_config: self.stream_config,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dify_config::StreamSection;

    #[test]
    fn test_builder_requires_base_url() {
        let result = ClientBuilder::new().build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        let result = ClientBuilder::new().base_url("not a url").build();
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_builder_rejects_bad_key() {
        let result = ClientBuilder::new()
            .base_url("http://localhost")
            .api_key("line\nbreak")
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_normalizes_trailing_slash() {
        let client = ClientBuilder::new()
            .base_url("https://api.dify.ai/v1")
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.dify.ai/v1/");

        let client = ClientBuilder::new()
            .base_url("https://api.dify.ai/v1/")
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.dify.ai/v1/");
    }

    #[test]
    fn test_url_building() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:5001/v1")
            .build()
            .unwrap();

        let url = client.url("workflows/run").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5001/v1/workflows/run");

        let url = client.url("/workflows/logs").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5001/v1/workflows/logs");
    }

    #[test]
    fn test_from_config() {
        let config = DifyConfig {
            base_url: Some("http://localhost:5001/v1".to_string()),
            api_key: Some("app-key".to_string()),
            stream_timeout_secs: Some(5),
            stream: Some(StreamSection {
                encoding_base64: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let client = DifyClient::from_config(&config).unwrap();

        assert_eq!(client.base_url().as_str(), "http://localhost:5001/v1/");
        assert!(client.stream_config().encoding_base64);
        assert_eq!(client.inner.stream_timeout, Duration::from_secs(5));
        assert_eq!(client.inner.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_from_empty_config_fails() {
        let result = DifyClient::from_config(&DifyConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
