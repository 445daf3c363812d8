// src/transport/http.rs

//! reqwest-backed transport.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use url::Url;

use super::{RequestOptions, Transport, validate_path};
use crate::error::{Result, TransportError};
use crate::models::ApiConfig;

/// HTTP transport over a shared asynchronous client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport from API settings.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Url::parse(&config.base_url)?;

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .build()
            .map_err(|e| crate::error::AppError::config(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL for `path` with `query` appended.
    pub fn endpoint(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> std::result::Result<Url, TransportError> {
        validate_path(path)?;

        let mut url = Url::parse(&format!("{}{}", self.base_url, path)).map_err(|_| {
            TransportError::InvalidEndpoint {
                path: path.to_string(),
            }
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> std::result::Result<Value, TransportError> {
        let url = self.endpoint(path, &options.query)?;
        let endpoint = url.to_string();
        log::debug!("{} {}", options.method, endpoint);

        let mut request = self
            .client
            .request(options.method, url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            log::warn!("Request to {} failed: {}", endpoint, e);
            TransportError::connectivity(&endpoint)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::http(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
            ));
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::connectivity(&endpoint)
            } else {
                TransportError::decode(&endpoint, e)
            }
        })?;

        serde_json::from_slice(&bytes).map_err(|e| TransportError::decode(&endpoint, e))
    }
}
