//! Network boundary.
//!
//! Strategies never talk to reqwest directly; they go through the [`Network`]
//! trait so tests can script the network and the worker can run against any
//! transport.
//!
//! ### Failure model
//! - A transport failure (DNS, refused connection, timeout) is `Err(Error::Network)`.
//! - Any HTTP status, including 4xx/5xx, is `Ok(Response)`; callers decide what
//!   a non-2xx means for them.

pub mod url;

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, resolve};

use cloister_core::{AppConfig, Error, Request, Response};

/// Configuration for the HTTP network.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "cloister/0.1")
    pub user_agent: String,

    /// Transport timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "cloister/0.1".to_string(), timeout: Duration::from_millis(20000), max_redirects: 5 }
    }
}

impl FetchConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), ..Default::default() }
    }
}

/// Something that can put requests on the wire.
#[async_trait]
pub trait Network: Send + Sync {
    /// Issue the request as-is.
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;

    /// POST a JSON body.
    async fn post_json(&self, url: &::url::Url, body: &serde_json::Value) -> Result<Response, Error>;
}

/// reqwest-backed [`Network`].
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    http: Client,
}

impl HttpNetwork {
    /// Create a new network client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    async fn into_response(response: reqwest::Response) -> Result<Response, Error> {
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method, e)))?;

        let response = self
            .http
            .request(method, request.url.clone())
            .send()
            .await
            .map_err(|e| Error::Network(format!("network error: {}", e)))?;

        let response = Self::into_response(response).await?;

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            response.status,
            start.elapsed().as_millis(),
            response.body.len()
        );

        Ok(response)
    }

    async fn post_json(&self, url: &::url::Url, body: &serde_json::Value) -> Result<Response, Error> {
        let response = self
            .http
            .post(url.clone())
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("network error: {}", e)))?;

        let response = Self::into_response(response).await?;
        tracing::debug!("posted to {} -> {}", url, response.status);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "cloister/0.1");
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "cloister-test".into(), timeout_ms: 1500, ..Default::default() };
        let config = FetchConfig::from_config(&app);
        assert_eq!(config.user_agent, "cloister-test");
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_http_network_new() {
        let network = HttpNetwork::new(FetchConfig::default());
        assert!(network.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let network = HttpNetwork::new(FetchConfig { timeout: Duration::from_millis(500), ..Default::default() }).unwrap();
        let request = Request::get(::url::Url::parse("http://127.0.0.1:9/").unwrap());
        let result = network.fetch(&request).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
