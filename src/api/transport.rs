//! HTTP transport for the sports-data API
//!
//! [`Transport`] is the seam between request policy (retries, envelope
//! checks) and the wire. [`HttpTransport`] is the production implementation
//! on top of `reqwest`.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Header carrying the static API key
pub const API_KEY_HEADER: &str = "x-apisports-key";

/// Raw HTTP response: status code plus undecoded body
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("transport failure: {0}")]
    Connection(String),
    #[error("failed to build HTTP client: {0}")]
    Setup(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET for `url` with the given query parameters
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, TransportError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    api_key: String,
}

impl HttpTransport {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(query)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}
