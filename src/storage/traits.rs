//! Storage trait and error types

use crate::state::PageEntry;
use crate::storage::{LinkRecord, NewLink, PageRecord, SiteLinkRecord, SiteRecord, SweepSummary};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Site not found: {0}")]
    SiteNotFound(i64),

    #[error("Page not found: {0}")]
    PageNotFound(i64),

    #[error("Link not found: {0}")]
    LinkNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Covers both the run-time operations the coordinator needs (run counter,
/// bulk page load, upserts, sweep) and the read/delete surface a
/// presentation layer would sit on.
pub trait Store {
    // ===== Run lifecycle =====

    /// Starts a new run for a site, creating the site row if needed
    ///
    /// Advances the site's run counter by one (a brand-new site starts at
    /// run 1) and stamps the start time.
    ///
    /// # Returns
    ///
    /// `(site_id, run_id)` for the run that just began
    fn begin_run(&mut self, site_url: &str) -> StorageResult<(i64, i64)>;

    /// Loads every stored page of a site into a URL-keyed map
    ///
    /// Called once at run start; the coordinator does change detection
    /// against this map instead of per-URL queries.
    fn load_pages(&self, site_id: i64) -> StorageResult<HashMap<String, PageEntry>>;

    /// Inserts or updates a page, overwriting hash and run counter
    ///
    /// A concurrent insert of the same `(site_id, url)` resolves through
    /// the conflict clause to an update, never an error.
    ///
    /// # Returns
    ///
    /// The page's row id
    fn upsert_page(
        &mut self,
        site_id: i64,
        url: &str,
        hash: &str,
        run_id: i64,
    ) -> StorageResult<i64>;

    /// Inserts or updates a scored link, overwriting score, keywords,
    /// anchor text, and run counter
    fn upsert_link(&mut self, link: &NewLink) -> StorageResult<i64>;

    /// Advances the run counter on all links of a page
    ///
    /// Used for unchanged pages: their links were not re-extracted, but
    /// they are still current and must survive the sweep.
    ///
    /// # Returns
    ///
    /// The number of links touched
    fn refresh_links(&mut self, page_id: i64, run_id: i64) -> StorageResult<usize>;

    /// Deletes every row of the site whose run counter lags `run_id`
    ///
    /// Runs in a single transaction: stale pages first (cascade removes
    /// their links), then stale links that survived on fresh pages. Must
    /// only be called after a run drained its frontier completely.
    fn sweep_stale(&mut self, site_id: i64, run_id: i64) -> StorageResult<SweepSummary>;

    // ===== Read surface =====

    /// Gets a site by row id
    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord>;

    /// Gets a site by its root URL
    fn get_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>>;

    /// Lists all pages of a site
    fn list_pages(&self, site_id: i64) -> StorageResult<Vec<PageRecord>>;

    /// Gets a page by row id
    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord>;

    /// Lists all links of a site joined with their page URL, best first
    fn list_links_for_site(&self, site_id: i64) -> StorageResult<Vec<SiteLinkRecord>>;

    /// Lists the links found on one page, best first
    fn list_links_for_page(&self, page_id: i64) -> StorageResult<Vec<LinkRecord>>;

    /// Gets a link by row id
    fn get_link(&self, link_id: i64) -> StorageResult<LinkRecord>;

    /// Counts the pages stored for a site
    fn count_pages(&self, site_id: i64) -> StorageResult<u64>;

    /// Counts the links stored for a site
    fn count_links(&self, site_id: i64) -> StorageResult<u64>;

    // ===== Deletion =====

    /// Deletes a site and everything under it
    fn delete_site(&mut self, site_id: i64) -> StorageResult<bool>;

    /// Deletes a page and its links
    fn delete_page(&mut self, page_id: i64) -> StorageResult<bool>;

    /// Deletes a single link
    fn delete_link(&mut self, link_id: i64) -> StorageResult<bool>;
}
