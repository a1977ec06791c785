//! HTTP client for the dispatch endpoint.
//!
//! [`ValidationClient::open`] validates the query locally, posts it, and
//! hands back the raw response body as a byte stream for
//! [`consume`](crate::consumer::consume). Everything that can go wrong
//! before the first byte is a [`ClientError`].

use anyhow::Context;
use futures::stream::{BoxStream, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::{ClientConfig, Config, StreamConfig};
use crate::dispatch::{validate_query, QueryError};

/// Response body of a dispatch request.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, reqwest::Error>>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryError),
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("backend rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("stream failed: {0}")]
    Stream(String),
}

#[derive(Debug, Clone)]
pub struct ValidationClient {
    http: reqwest::Client,
    base_url: String,
    min_query_chars: usize,
}

impl ValidationClient {
    pub fn new(client: &ClientConfig, stream: &StreamConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(client.connect_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: client.base_url.trim_end_matches('/').to_string(),
            min_query_chars: stream.min_query_chars,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(&config.client, &config.stream)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Validate `query` without contacting the backend.
    pub fn check_query<'a>(&self, query: &'a str) -> Result<&'a str, ClientError> {
        Ok(validate_query(query, self.min_query_chars)?)
    }

    /// Start a dispatch and return the event-stream body.
    pub async fn open(&self, query: &str) -> Result<ByteStream, ClientError> {
        let query = self.check_query(query)?;
        let url = format!("{}/api/validate", self.base_url);
        debug!(url = %url, "opening report stream");

        let resp = self
            .http
            .post(&url)
            .header("accept", "text/event-stream")
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| ClientError::BackendUnavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&body, status.canonical_reason()),
            });
        }

        Ok(resp.bytes_stream().map(|chunk| chunk.map(|b| b.to_vec())).boxed())
    }
}

/// The server's `error` field, else the raw body, else the status reason.
fn rejection_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            return message.to_string();
        }
    }
    let body = body.trim();
    if !body.is_empty() {
        return body.chars().take(200).collect();
    }
    reason.unwrap_or("request rejected").to_string()
}
