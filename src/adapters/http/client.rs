//! reqwest-backed [`JsonHttpClient`]

use super::JsonHttpClient;
use crate::config::FetchConfig;
use crate::domain::{FetchError, Result, RetrieverError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

/// Longest slice of an error body kept in [`FetchError::Status`]
const MAX_ERROR_BODY: usize = 512;

/// HTTP client for source APIs
///
/// One instance is shared by every fetch of a run; reqwest pools
/// connections internally so clones are cheap.
#[derive(Debug, Clone)]
pub struct ReqwestJsonClient {
    client: Client,
}

impl ReqwestJsonClient {
    /// Build a client with the configured connect and request timeouts
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .timeout(Duration::from_secs(config.read_timeout_seconds))
            .user_agent(concat!("data-retriever/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RetrieverError::Other(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Wrap an existing reqwest client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn send(
        &self,
        url: &str,
        request: RequestBuilder,
    ) -> std::result::Result<Value, FetchError> {
        tracing::debug!(url = %url, "Sending source request");

        let response = request.send().await.map_err(|e| transport_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                message: truncate(&body, MAX_ERROR_BODY),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(url, &e))?;

        serde_json::from_str(&body).map_err(|e| FetchError::InvalidResponse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl JsonHttpClient for ReqwestJsonClient {
    async fn get_json(&self, url: &str) -> std::result::Result<Value, FetchError> {
        self.send(url, self.client.get(url)).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> std::result::Result<Value, FetchError> {
        self.send(url, self.client.post(url).json(body)).await
    }
}

fn transport_error(url: &str, err: &reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else {
        FetchError::ConnectionFailed {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
