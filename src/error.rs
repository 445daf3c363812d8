// src/error.rs

//! Unified error handling for the market data layer.

use thiserror::Error;

/// Result type alias for market-lens operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Failure of a single request against the remote API.
///
/// Cloneable so that a failed fetch can be stored on a cache entry and shown
/// to every consumer of that key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Path is not a relative endpoint segment
    #[error("Invalid endpoint path '{path}'")]
    InvalidEndpoint { path: String },

    /// Endpoint unreachable (DNS, refused connection, timeout)
    #[error("Failed to connect to API at {endpoint}")]
    Connectivity { endpoint: String },

    /// Non-2xx response
    #[error("API request failed: {status} {status_text}")]
    Http { status: u16, status_text: String },

    /// Response body is not the expected JSON
    #[error("Malformed response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl TransportError {
    /// Create a connectivity error for an endpoint.
    pub fn connectivity(endpoint: impl Into<String>) -> Self {
        Self::Connectivity {
            endpoint: endpoint.into(),
        }
    }

    /// Create an HTTP status error.
    pub fn http(status: u16, status_text: impl Into<String>) -> Self {
        Self::Http {
            status,
            status_text: status_text.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(endpoint: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Remote API request failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The same mutation is already running
    #[error("Mutation '{action}' is already in flight")]
    MutationInFlight { action: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller-supplied input is malformed
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// The transport failure behind this error, if any.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}
