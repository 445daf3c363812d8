// src/config.rs

//! Configuration loading utilities.
//!
//! Resolution order: TOML file (or defaults when it is missing or broken),
//! then `MARKET_*` environment overrides, then validation.

use std::path::Path;

use crate::error::Result;
use crate::models::Config;
use crate::utils::log;

/// Config file looked up when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "market-lens.toml";

/// Load configuration from a TOML file with environment overrides.
///
/// Falls back to defaults if loading fails.
pub fn load_config(path: &Path) -> Result<Config> {
    load_config_with(path, |name| std::env::var(name).ok())
}

/// Same as [`load_config`] with an explicit variable lookup.
pub fn load_config_with<F>(path: &Path, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = if path.exists() {
        Config::load(path).unwrap_or_else(|e| {
            log::warn(&format!("Failed to load config from {path:?}: {e}"));
            log::warn("Using default configuration.");
            Config::default()
        })
    } else {
        ::log::debug!("No config file at {:?}, using defaults", path);
        Config::default()
    };

    config.apply_overrides(lookup);
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_with(&dir.path().join("none.toml"), |_| None).unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8001");
    }

    #[test]
    fn test_broken_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\nbase_url = ").unwrap();
        let config = load_config_with(file.path(), |_| None).unwrap();
        assert_eq!(config.cache.stale_time_secs, 300);
    }

    #[test]
    fn test_env_override_wins_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\nstale_time_secs = 60").unwrap();

        let config = load_config_with(file.path(), |name| {
            (name == "MARKET_CACHE_STALE_SECS").then(|| "10".to_string())
        })
        .unwrap();
        assert_eq!(config.cache.stale_time_secs, 10);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_with(&dir.path().join("none.toml"), |name| {
            (name == "MARKET_API_URL").then(|| "no scheme here".to_string())
        });
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
