use serde::Deserialize;
use std::collections::HashMap;

/// Main configuration structure for linkscout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    pub filter: FilterConfig,
    pub storage: StorageConfig,

    /// Keyword weight overrides (keyword -> weight in [0, 1])
    ///
    /// Keywords not listed here fall back to the built-in weight table,
    /// and unknown keywords get a low default weight.
    #[serde(default)]
    pub keywords: HashMap<String, f64>,
}

/// The site to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Root URL of the site (crawl never leaves this host)
    pub url: String,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent worker tasks draining the frontier
    pub workers: u32,

    /// User agent string sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Timeout for fetching a single page (milliseconds)
    #[serde(rename = "fetch-timeout-ms")]
    pub fetch_timeout_ms: u64,

    /// Timeout for inspecting a single page's content (milliseconds)
    #[serde(rename = "inspect-timeout-ms")]
    pub inspect_timeout_ms: u64,
}

/// URL filter configuration
///
/// These limits bound the frontier: URLs that exceed them are rejected
/// (or truncated, for query parameters) before they are ever enqueued.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Maximum link depth from the site root
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of query parameters kept on a URL (excess is truncated)
    #[serde(rename = "max-query-params")]
    pub max_query_params: usize,

    /// Maximum number of path segments (longer paths are rejected)
    #[serde(rename = "max-path-segments")]
    pub max_path_segments: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}
