// src/pipeline/validate.rs

use std::path::Path;

use crate::config::load_config;
use crate::error::Result;
use crate::models::Config;
use crate::services::MarketData;
use crate::utils::log;

/// Load and validate configuration, printing the effective values.
pub fn run_validate(path: &Path) -> Result<Config> {
    log::header("Validating configuration");

    match load_config(path) {
        Ok(config) => {
            log::success("Configuration OK");
            log::sub_item(&format!("API: {}", config.api.base_url));
            log::sub_item(&format!("Timeout: {}s", config.api.timeout_secs));
            log::sub_item(&format!(
                "Cache: stale after {}s, {} retr(ies) every {}ms",
                config.cache.stale_time_secs, config.cache.max_retries, config.cache.retry_delay_ms
            ));
            log::sub_item(&format!(
                "Search: {} per page, {} offers fetched",
                config.search.page_size, config.search.offers_limit
            ));
            log::sub_item(&format!(
                "Vocabulary: {} technologies",
                config.tagger.technologies.len()
            ));
            Ok(config)
        }
        Err(e) => {
            log::error(&format!("Validation failed: {e}"));
            Err(e)
        }
    }
}

/// Probe the API health endpoint.
pub async fn run_health(market: &MarketData) -> Result<()> {
    log::header("API health");

    let health = market.health().await.inspect_err(|e| {
        log::error(&format!("API unreachable: {e}"));
    })?;
    log::success(&format!("API reachable: {health}"));
    Ok(())
}
