//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler:
//! - SQLite database initialization and schema management
//! - Site, page, and link persistence with run-counter watermarks
//! - The post-run staleness sweep
//! - The read surface a presentation layer sits on

mod schema;
mod sqlite;
mod traits;

pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::SqliteStore;
pub use traits::{StorageError, StorageResult, Store};

use crate::CrawlError;
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_store<P: AsRef<Path>>(path: P) -> Result<SqliteStore, CrawlError> {
    SqliteStore::new(path.as_ref())
}

/// A site row
#[derive(Debug, Clone)]
pub struct SiteRecord {
    pub id: i64,
    pub url: String,
    /// Current run counter; rows with an older counter are stale
    pub run_id: i64,
    /// When the current run started (informational only)
    pub run_started_at: String,
}

/// A page row
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub id: i64,
    pub site_id: i64,
    pub url: String,
    pub hash: String,
    pub run_id: i64,
    pub crawled_at: String,
}

/// A link row
#[derive(Debug, Clone)]
pub struct LinkRecord {
    pub id: i64,
    pub site_id: i64,
    pub page_id: i64,
    pub url: String,
    pub text: String,
    pub score: f64,
    /// Padded delimited keyword encoding, e.g. ";budget;rfp;"
    pub keywords: String,
    pub run_id: i64,
}

/// A link row joined with the URL of the page it was found on
#[derive(Debug, Clone)]
pub struct SiteLinkRecord {
    pub link: LinkRecord,
    pub page_url: String,
}

/// Fields for inserting or updating a link
#[derive(Debug, Clone)]
pub struct NewLink {
    pub site_id: i64,
    pub page_id: i64,
    pub url: String,
    pub text: String,
    pub score: f64,
    pub keywords: String,
    pub run_id: i64,
}

/// Counts of rows removed by a staleness sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Stale pages deleted (their links went with them via cascade)
    pub pages_deleted: usize,
    /// Stale links deleted from pages that survived
    pub links_deleted: usize,
}
