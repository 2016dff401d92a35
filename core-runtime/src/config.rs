//! # Graph Connection Configuration
//!
//! Provides the validated settings every drive request is issued with.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `GraphConfig`
//! instance that holds the credentials, the remote endpoint and the transport
//! to use. It enforces fail-fast validation so that a misconfigured accessor
//! never reaches the network.
//!
//! ## Required Settings
//!
//! - `access_token` - Bearer token for the Graph API. Acquiring and refreshing
//!   it is the host's job.
//!
//! ## Optional Settings (with defaults)
//!
//! - `base_url` - Graph endpoint (default: `https://graph.microsoft.com`)
//! - `request_timeout` - Per-request timeout (default: 60 seconds)
//! - `verify_tls` - Certificate verification (default: on)
//! - `HttpClient` - Transport (desktop default: reqwest)
//!
//! When the `desktop-shims` feature is enabled, a `ReqwestHttpClient` honoring
//! `request_timeout` and `verify_tls` is injected if no client is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::GraphConfig;
//! use std::time::Duration;
//!
//! let config = GraphConfig::builder()
//!     .access_token(token)
//!     .request_timeout(Duration::from_secs(30))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::logging::redact_if_sensitive;
use bridge_traits::HttpClient;
use std::sync::Arc;
use std::time::Duration;

/// Default Microsoft Graph endpoint
pub const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com";

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Connection settings for the Graph API.
///
/// Use [`GraphConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct GraphConfig {
    /// OAuth 2.0 bearer token
    pub access_token: String,

    /// Endpoint that relative request paths are joined onto, without a
    /// trailing slash
    pub base_url: String,

    /// Timeout applied to each request
    pub request_timeout: Duration,

    /// Whether TLS certificates are verified
    pub verify_tls: bool,

    /// Transport used for every request
    pub http_client: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphConfig")
            .field(
                "access_token",
                &redact_if_sensitive("access_token", &self.access_token),
            )
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("verify_tls", &self.verify_tls)
            .field("http_client", &"HttpClient { ... }")
            .finish()
    }
}

impl GraphConfig {
    /// Creates a new builder for constructing a `GraphConfig`.
    pub fn builder() -> GraphConfigBuilder {
        GraphConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Access token is not empty
    /// - Base URL is an absolute http(s) URL
    /// - Request timeout is > 0 and at most 10 minutes
    pub fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(Error::Config("Access token cannot be empty".to_string()));
        }

        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(Error::Config(format!(
                "Base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout > MAX_REQUEST_TIMEOUT {
            return Err(Error::Config(
                "Request timeout exceeds maximum of 600 seconds".to_string(),
            ));
        }

        Ok(())
    }

    /// Join a path onto the base URL. Absolute URLs are returned unchanged.
    pub fn resolve_url(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("https://") || path_or_url.starts_with("http://") {
            path_or_url.to_string()
        } else if path_or_url.starts_with('/') {
            format!("{}{}", self.base_url, path_or_url)
        } else {
            format!("{}/{}", self.base_url, path_or_url)
        }
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(
    request_timeout: Duration,
    verify_tls: bool,
) -> Result<Arc<dyn HttpClient>> {
    let client = bridge_desktop::ReqwestHttpClient::builder()
        .timeout(request_timeout)
        .verify_tls(verify_tls)
        .build()
        .map_err(|e| Error::Internal(e.to_string()))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(
    _request_timeout: Duration,
    _verify_tls: bool,
) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client implementation provided. \
                 Desktop: enable the 'desktop-shims' feature to use ReqwestHttpClient. \
                 Other hosts: inject an HttpClient with .http_client()."
            .to_string(),
    })
}

/// Builder for [`GraphConfig`].
#[derive(Default)]
pub struct GraphConfigBuilder {
    access_token: Option<String>,
    base_url: Option<String>,
    request_timeout: Option<Duration>,
    verify_tls: Option<bool>,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl GraphConfigBuilder {
    /// Sets the bearer token sent with every request.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Sets the Graph endpoint.
    ///
    /// Default: `https://graph.microsoft.com`
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use core_runtime::config::GraphConfig;
    ///
    /// let builder = GraphConfig::builder()
    ///     .base_url("https://graph.microsoft.us");
    /// ```
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the per-request timeout.
    ///
    /// Default: 60 seconds
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = Some(verify);
        self
    }

    /// Injects the transport.
    ///
    /// When set, `request_timeout` is still attached to each request but
    /// `verify_tls` is left to the injected client.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the final `GraphConfig` instance.
    ///
    /// Returns an error if:
    /// - The access token is missing or empty
    /// - No `HttpClient` is available
    /// - Any value fails [`GraphConfig::validate`]
    pub fn build(self) -> Result<GraphConfig> {
        let access_token = self.access_token.ok_or_else(|| {
            Error::Config("Access token is required. Use .access_token() to set it.".to_string())
        })?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let verify_tls = self.verify_tls.unwrap_or(true);

        let config = GraphConfig {
            access_token,
            base_url,
            request_timeout,
            verify_tls,
            http_client: match self.http_client {
                Some(client) => client,
                None => provide_default_http_client(request_timeout, verify_tls)?,
            },
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{HttpRequest, HttpResponse};

    struct NoopHttpClient;

    #[async_trait]
    impl HttpClient for NoopHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse {
                status: 200,
                headers: Default::default(),
                body: bytes::Bytes::new(),
            })
        }
    }

    fn builder() -> GraphConfigBuilder {
        GraphConfig::builder()
            .access_token("token-123")
            .http_client(Arc::new(NoopHttpClient))
    }

    #[test]
    fn test_builder_defaults() {
        let config = builder().build().unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert!(config.verify_tls);
    }

    #[test]
    fn test_builder_requires_access_token() {
        let result = GraphConfig::builder()
            .http_client(Arc::new(NoopHttpClient))
            .build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Access token is required"));
    }

    #[test]
    fn test_validate_rejects_blank_token() {
        let result = builder().access_token("   ").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_relative_base_url() {
        let result = builder().base_url("graph.microsoft.com").build();
        assert!(result.unwrap_err().to_string().contains("Base URL"));
    }

    #[test]
    fn test_validate_rejects_bad_timeouts() {
        assert!(builder().request_timeout(Duration::ZERO).build().is_err());
        assert!(builder()
            .request_timeout(Duration::from_secs(601))
            .build()
            .is_err());
        assert!(builder()
            .request_timeout(Duration::from_secs(600))
            .build()
            .is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = builder().base_url("https://example.test/").build().unwrap();
        assert_eq!(config.base_url, "https://example.test");
    }

    #[test]
    fn test_resolve_url() {
        let config = builder().base_url("https://example.test").build().unwrap();

        assert_eq!(
            config.resolve_url("/v1.0/sites/abc/drive"),
            "https://example.test/v1.0/sites/abc/drive"
        );
        assert_eq!(
            config.resolve_url("v1.0/drives/d1"),
            "https://example.test/v1.0/drives/d1"
        );
        assert_eq!(
            config.resolve_url("https://other.test/v1.0/next?page=2"),
            "https://other.test/v1.0/next?page=2"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = builder().build().unwrap();
        let rendered = format!("{:?}", config);

        assert!(!rendered.contains("token-123"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_http_client_is_capability_error() {
        let result = GraphConfig::builder().access_token("token").build();
        assert!(matches!(result, Err(Error::CapabilityMissing { .. })));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_default_http_client() {
        let config = GraphConfig::builder()
            .access_token("token")
            .verify_tls(false)
            .build()
            .unwrap();
        assert!(!config.verify_tls);
    }

    #[test]
    fn test_config_is_cloneable() {
        let config = builder().build().unwrap();
        let cloned = config.clone();
        assert_eq!(cloned.access_token, config.access_token);
        assert!(Arc::ptr_eq(&cloned.http_client, &config.http_client));
    }
}
