use crate::config::types::{Config, CrawlerConfig, FilterConfig, StorageConfig};
use crate::score::KEYWORD_DELIMITER;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Invalid values are fatal: nothing is clamped or defaulted here.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_url(&config.site.url)?;
    validate_crawler_config(&config.crawler)?;
    validate_filter_config(&config.filter)?;
    validate_storage_config(&config.storage)?;
    validate_keyword_weights(config)?;
    Ok(())
}

/// Validates the site root URL
fn validate_site_url(url_str: &str) -> Result<(), ConfigError> {
    if url_str.is_empty() {
        return Err(ConfigError::Validation(
            "site.url cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(url_str)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid site.url '{}': {}", url_str, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "site.url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "site.url '{}' has no host",
            url_str
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.fetch_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "fetch-timeout-ms must be >= 100ms, got {}ms",
            config.fetch_timeout_ms
        )));
    }

    if config.inspect_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "inspect-timeout-ms must be >= 100ms, got {}ms",
            config.inspect_timeout_ms
        )));
    }

    Ok(())
}

/// Validates filter configuration
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    if config.max_depth < 1 {
        return Err(ConfigError::Validation(format!(
            "max-depth must be >= 1, got {}",
            config.max_depth
        )));
    }

    // max-query-params may be 0: that strips every query string entirely
    if config.max_path_segments < 1 {
        return Err(ConfigError::Validation(format!(
            "max-path-segments must be >= 1, got {}",
            config.max_path_segments
        )));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates keyword weight overrides
fn validate_keyword_weights(config: &Config) -> Result<(), ConfigError> {
    for (keyword, weight) in &config.keywords {
        if keyword.is_empty() {
            return Err(ConfigError::Validation(
                "keyword names cannot be empty".to_string(),
            ));
        }

        // The delimiter is reserved for the stored keyword encoding
        if keyword.contains(KEYWORD_DELIMITER) {
            return Err(ConfigError::Validation(format!(
                "keyword '{}' contains the reserved delimiter '{}'",
                keyword, KEYWORD_DELIMITER
            )));
        }

        if !(0.0..=1.0).contains(weight) {
            return Err(ConfigError::Validation(format!(
                "weight for keyword '{}' must be within [0, 1], got {}",
                keyword, weight
            )));
        }
    }

    Ok(())
}
