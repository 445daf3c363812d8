//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote API endpoint settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Query cache policy
    #[serde(default)]
    pub cache: CacheConfig,

    /// Client-side search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Technology vocabulary
    #[serde(default)]
    pub tagger: TaggerConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply overrides from environment-style variables.
    ///
    /// `lookup` is usually `|name| std::env::var(name).ok()`. Unparsable values
    /// are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MARKET_API_URL") {
            self.api.base_url = url;
        }

        if let Some(secs) = lookup("MARKET_API_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.api.timeout_secs = secs;
        }

        if let Some(secs) = lookup("MARKET_CACHE_STALE_SECS").and_then(|v| v.parse().ok()) {
            self.cache.stale_time_secs = secs;
        }

        if let Some(n) = lookup("MARKET_CACHE_MAX_RETRIES").and_then(|v| v.parse().ok()) {
            self.cache.max_retries = n;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url)
            .map_err(|e| AppError::validation(format!("api.base_url is invalid: {e}")))?;
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        if self.search.page_size == 0 {
            return Err(AppError::validation("search.page_size must be > 0"));
        }
        if self.search.offers_limit == 0 {
            return Err(AppError::validation("search.offers_limit must be > 0"));
        }
        if self.tagger.technologies.is_empty() {
            return Err(AppError::validation("No technologies defined"));
        }
        Ok(())
    }
}

/// Remote API endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined to
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
        }
    }
}

/// Staleness and retry policy shared by all queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Age after which an entry is refetched on the next read
    #[serde(default = "defaults::stale_time")]
    pub stale_time_secs: u64,

    /// Retries after the first failed attempt
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts in milliseconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_secs: defaults::stale_time(),
            max_retries: defaults::max_retries(),
            retry_delay_ms: defaults::retry_delay(),
        }
    }
}

/// Client-side search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default page size for search results
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// Number of offers fetched for local filtering
    #[serde(default = "defaults::offers_limit")]
    pub offers_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::page_size(),
            offers_limit: defaults::offers_limit(),
        }
    }
}

/// Technology vocabulary used for tagging postings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggerConfig {
    #[serde(default = "defaults::technologies")]
    pub technologies: Vec<String>,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            technologies: defaults::technologies(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// debug, info, warn or error
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // API defaults
    pub fn base_url() -> String {
        "http://127.0.0.1:8001".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn user_agent() -> String {
        concat!("market-lens/", env!("CARGO_PKG_VERSION")).into()
    }

    // Cache defaults
    pub fn stale_time() -> u64 {
        5 * 60
    }
    pub fn max_retries() -> u32 {
        1
    }
    pub fn retry_delay() -> u64 {
        1000
    }

    // Search defaults
    pub fn page_size() -> usize {
        20
    }
    pub fn offers_limit() -> usize {
        100
    }

    // Tagger defaults
    pub fn technologies() -> Vec<String> {
        [
            "Python",
            "JavaScript",
            "React",
            "Node.js",
            "Java",
            "C#",
            "PHP",
            "Ruby",
            "Go",
            "Rust",
            "TypeScript",
            "Angular",
            "Vue",
            "Django",
            "Flask",
            "Express",
            "Spring",
            "Laravel",
            "Rails",
            "Docker",
            "Kubernetes",
            "AWS",
            "Azure",
            "MongoDB",
            "PostgreSQL",
            "MySQL",
            "Redis",
            "GraphQL",
            "REST",
            "API",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_page_size() {
        let mut config = Config::default();
        config.search.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_vocabulary() {
        let mut config = Config::default();
        config.tagger.technologies.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"http://api.example.com\"\n\n[cache]\nmax_retries = 3"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.api.base_url, "http://api.example.com");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.cache.max_retries, 3);
        assert_eq!(config.cache.stale_time_secs, 300);
        assert_eq!(config.tagger.technologies.len(), 30);
    }

    #[test]
    fn overrides_replace_values_and_skip_garbage() {
        let vars: HashMap<&str, &str> = [
            ("MARKET_API_URL", "http://10.0.0.5:9000"),
            ("MARKET_API_TIMEOUT_SECS", "5"),
            ("MARKET_CACHE_MAX_RETRIES", "many"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.cache.max_retries, 1);
    }
}
