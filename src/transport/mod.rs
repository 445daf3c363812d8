//! Transport layer for the remote job market API.
//!
//! A [`Transport`] executes one request and returns the decoded JSON body.
//! It never retries; retry policy belongs to the query cache.

mod http;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::error::TransportError;

pub use http::HttpTransport;

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    /// Extra headers; `Content-Type: application/json` is always sent
    pub headers: Vec<(String, String)>,
    /// Query string parameters, in order
    pub query: Vec<(String, String)>,
    /// JSON body
    pub body: Option<Value>,
}

impl RequestOptions {
    /// A plain GET.
    pub fn get() -> Self {
        Self::default()
    }

    /// A POST carrying `body` as JSON.
    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::default()
        }
    }

    /// Append a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Append a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Executes requests against a configured base endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request to `path` (e.g. `/offers/`) and decode the JSON reply.
    async fn request(&self, path: &str, options: RequestOptions) -> Result<Value, TransportError>;
}

/// Check that `path` is a relative endpoint segment.
pub(crate) fn validate_path(path: &str) -> Result<(), TransportError> {
    if !path.starts_with('/') || path.contains("://") || path.contains(['?', '#']) {
        return Err(TransportError::InvalidEndpoint {
            path: path.to_string(),
        });
    }
    Ok(())
}
