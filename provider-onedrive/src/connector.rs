//! Microsoft Graph request capability
//!
//! [`GraphApi`] is the single seam between the drive logic and the network:
//! one method that issues a request and hands back the decoded JSON body.
//! [`GraphConnector`] is the production implementation, binding a base
//! endpoint and bearer token to an injected `HttpClient`.

use async_trait::async_trait;
use bridge_traits::http::{HttpMethod, HttpRequest, HttpResponse};
use core_runtime::config::GraphConfig;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::{OneDriveError, Result};

/// Seconds to wait when a 429 carries no usable `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Authenticated request capability against the Graph API
///
/// `url` is either a path relative to the configured endpoint
/// (`/v1.0/...`) or an absolute URL such as an `@odata.nextLink`.
///
/// Graph error bodies (`{"error": {...}}`) are returned as values, not as
/// errors, so callers can treat codes like `itemNotFound` as outcomes.
#[async_trait]
pub trait GraphApi: Send + Sync {
    async fn request(&self, method: HttpMethod, url: &str) -> Result<Value>;
}

/// `GraphApi` over a bridge `HttpClient`
pub struct GraphConnector {
    config: GraphConfig,
}

impl GraphConnector {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    fn build_request(&self, method: HttpMethod, url: &str) -> HttpRequest {
        HttpRequest::new(method, self.config.resolve_url(url))
            .bearer_token(self.config.access_token.as_str())
            .header("Accept", "application/json")
            .timeout(self.config.request_timeout)
    }

    /// Map a raw response to the decoded body
    fn decode(response: HttpResponse) -> Result<Value> {
        match response.status {
            401 => return Err(OneDriveError::AuthRequired),
            429 => {
                let retry_after = response
                    .header("Retry-After")
                    .and_then(|value| value.trim().parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                return Err(OneDriveError::Throttled(retry_after));
            }
            _ => {}
        }

        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        match serde_json::from_slice::<Value>(&response.body) {
            Ok(value) => Ok(value),
            Err(_) if !response.is_success() => Err(OneDriveError::ApiError {
                status_code: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            }),
            Err(e) => Err(OneDriveError::ParseError(format!(
                "response body is not JSON: {}",
                e
            ))),
        }
    }
}

#[async_trait]
impl GraphApi for GraphConnector {
    #[instrument(skip(self, method), fields(method = %method))]
    async fn request(&self, method: HttpMethod, url: &str) -> Result<Value> {
        if self.config.access_token.trim().is_empty() {
            warn!("No access token configured, refusing to send request");
            return Err(OneDriveError::AuthRequired);
        }

        let request = self.build_request(method, url);
        let response = self.config.http_client.execute(request).await?;
        let status = response.status;

        if response.is_success() {
            debug!(status, bytes = response.body.len(), "Graph request succeeded");
        } else {
            warn!(status, "Graph request returned an error status");
        }

        Self::decode(response)
    }
}
