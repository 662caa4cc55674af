//! HTTP transport using reqwest.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::transport::{Transport, TransportError, TransportResponse};
use crate::{ClientConfig, Result, SearchError, SearchRequest};

/// Posts search requests as JSON to the configured endpoint.
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Creates a transport from configuration. The timeout bounds the whole
    /// exchange, body included.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let endpoint = config.endpoint_url()?;
        let client = Client::builder()
            .user_agent(concat!("smart-search/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()
            .map_err(|e| SearchError::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client, endpoint })
    }

    /// Creates a transport with a custom reqwest client.
    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// Endpoint requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &SearchRequest) -> std::result::Result<TransportResponse, TransportError> {
        let start = Instant::now();
        debug!(
            "POST {} (engine={}, provider={}, custom_keys={})",
            self.endpoint,
            request.search_engine,
            request.llm_provider,
            request.has_custom_keys()
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if status.is_success() => {
                return Err(TransportError::NoResponse(e.to_string()));
            }
            Err(e) => {
                warn!("Failed to read error body for status {}: {}", status, e);
                String::new()
            }
        };

        debug!(
            "Response {} in {}ms ({} bytes)",
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );
        Ok(TransportResponse::new(status.as_u16(), body))
    }
}

/// Builder errors never left the process; everything else was dispatched.
fn send_error(e: reqwest::Error) -> TransportError {
    if e.is_builder() {
        TransportError::NotSent(e.to_string())
    } else {
        if e.is_timeout() {
            warn!("Search request timed out");
        }
        TransportError::NoResponse(e.to_string())
    }
}
