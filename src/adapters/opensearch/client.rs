//! OpenSearch REST client
//!
//! Talks to the cluster over plain HTTP with basic authentication. Only the
//! calls the retriever needs are implemented: the root ping and `_bulk`.

use crate::config::OutputConfig;
use crate::domain::{OutputError, Result, RetrieverError};
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use secrecy::ExposeSecret;
use std::time::Duration;

/// Client bound to one OpenSearch host and index
#[derive(Debug, Clone)]
pub struct OpenSearchClient {
    host: String,
    index: String,
    client: Client,
    auth_header: String,
}

impl OpenSearchClient {
    /// Create a client from the output configuration
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::MissingCredentials`] when either credential is
    /// absent, or an error if the HTTP client cannot be built.
    pub fn new(config: &OutputConfig) -> Result<Self> {
        let (username, password) = match (&config.username, &config.password) {
            (Some(user), Some(pass)) if !user.expose_secret().is_empty() => (user, pass),
            _ => {
                return Err(OutputError::MissingCredentials(
                    "OpenSearch credentials not provided".to_string(),
                )
                .into())
            }
        };

        let credentials = format!(
            "{}:{}",
            username.expose_secret().as_ref(),
            password.expose_secret().as_ref()
        );
        let auth_header = format!("Basic {}", general_purpose::STANDARD.encode(credentials));

        if config.use_ssl && config.host.starts_with("http://") {
            tracing::warn!(host = %config.host, "use_ssl is set but host uses plain http");
        }

        let mut client_builder =
            ClientBuilder::new().timeout(Duration::from_secs(config.request_timeout_seconds));

        if !config.verify_certs {
            tracing::warn!("TLS certificate verification disabled for OpenSearch");
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder
            .build()
            .map_err(|e| RetrieverError::Other(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            host: config.host.trim_end_matches('/').to_string(),
            index: config.index.clone(),
            client,
            auth_header,
        })
    }

    /// Create a client and verify the host answers
    ///
    /// # Errors
    ///
    /// Same as [`OpenSearchClient::new`] and [`OpenSearchClient::ping`].
    pub async fn connect(config: &OutputConfig) -> Result<Self> {
        let client = Self::new(config)?;
        client.ping().await?;
        tracing::info!(host = %client.host, "Connected to OpenSearch host");
        Ok(client)
    }

    /// Connectivity check against the cluster root
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::ConnectionFailed`] on transport failure or a
    /// non-success status.
    pub async fn ping(&self) -> Result<()> {
        let url = format!("{}/", self.host);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| self.connection_failed(e.to_string()))?;

        if !response.status().is_success() {
            tracing::error!(
                host = %self.host,
                status = %response.status(),
                "Failed to connect to OpenSearch host"
            );
            return Err(self.connection_failed(format!("ping returned {}", response.status())));
        }
        Ok(())
    }

    /// Host this client writes to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Target index
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Send an NDJSON body to `_bulk` and return the raw response text
    pub(crate) async fn post_bulk(&self, body: String) -> Result<String> {
        let url = format!("{}/_bulk", self.host);
        let response = self
            .authorized(self.client.post(&url))
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| self.connection_failed(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| OutputError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            return Err(OutputError::BulkRejected {
                index: self.index.clone(),
                message: format!("status {status}: {text}"),
            }
            .into());
        }
        Ok(text)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", &self.auth_header)
    }

    fn connection_failed(&self, message: String) -> RetrieverError {
        OutputError::ConnectionFailed {
            host: self.host.clone(),
            message,
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn output_config(host: &str) -> OutputConfig {
        OutputConfig {
            destination: "opensearch".to_string(),
            host: host.to_string(),
            index: "crdc-links".to_string(),
            use_ssl: false,
            verify_certs: true,
            request_timeout_seconds: 5,
            username: Some(secret_string("admin".to_string())),
            password: Some(secret_string("admin".to_string())),
        }
    }

    #[test]
    fn test_missing_credentials() {
        let mut config = output_config("http://localhost:9200");
        config.password = None;
        let err = OpenSearchClient::new(&config).unwrap_err();
        assert!(matches!(
            err,
            RetrieverError::Output(OutputError::MissingCredentials(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_pings_with_basic_auth() {
        let mut server = mockito::Server::new_async().await;
        // base64("admin:admin")
        let mock = server
            .mock("GET", "/")
            .match_header("authorization", "Basic YWRtaW46YWRtaW4=")
            .with_status(200)
            .with_body(r#"{"cluster_name": "test"}"#)
            .create_async()
            .await;

        let client = OpenSearchClient::connect(&output_config(&server.url()))
            .await
            .unwrap();
        assert_eq!(client.index(), "crdc-links");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ping_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(401)
            .create_async()
            .await;

        let err = OpenSearchClient::connect(&output_config(&server.url()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RetrieverError::Output(OutputError::ConnectionFailed { .. })
        ));
    }
}
