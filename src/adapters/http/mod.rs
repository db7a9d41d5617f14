//! JSON-over-HTTP client used by the fetch strategies
//!
//! Sources are fetched through the [`JsonHttpClient`] trait so the fetch layer
//! can be exercised against mock servers or in-memory fakes.

pub mod client;

pub use client::ReqwestJsonClient;

use crate::domain::FetchError;
use async_trait::async_trait;
use serde_json::Value;

/// Minimal JSON request surface needed by the fetch strategies
#[async_trait]
pub trait JsonHttpClient: Send + Sync {
    /// GET `url` and decode the body as JSON
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on transport failure, non-success status or
    /// an undecodable body.
    async fn get_json(&self, url: &str) -> Result<Value, FetchError>;

    /// POST `body` as JSON to `url` and decode the response as JSON
    ///
    /// # Errors
    ///
    /// Same as [`JsonHttpClient::get_json`].
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, FetchError>;
}
