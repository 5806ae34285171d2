//! Configuration module for linkscout
//!
//! This module handles loading, parsing, and validating TOML configuration files.

mod parser;
pub(crate) mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, FilterConfig, SiteConfig, StorageConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
