//! Crawling engine
//!
//! The coordinator drives a pool of worker tasks over a shared frontier,
//! fetching pages through the [`PageFetcher`] seam, detecting content
//! changes, and judging outbound links through the [`ContentInspector`]
//! seam. [`crawl`] wires the default implementations together for the
//! binary; the pieces are public so callers can swap their own in.

mod change;
mod coordinator;
mod fetcher;
mod inspector;
mod parser;

pub use change::{content_hash, detect, ChangeStatus};
pub use coordinator::{Coordinator, CrawlOutcome};
pub use fetcher::{build_http_client, FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use inspector::{
    CandidateLink, ContentInspector, InspectError, KeywordScanInspector, LinkFindings,
};
pub use parser::{extract_raw_links, RawLink};

use crate::config::Config;
use crate::score::KeywordWeights;
use crate::storage::{open_store, Store};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Runs one crawl with the default HTTP fetcher and keyword inspector
pub async fn crawl(config: Config) -> Result<CrawlOutcome, crate::CrawlError> {
    let store = open_store(&config.storage.database_path)?;
    let store: Arc<Mutex<dyn Store + Send>> = Arc::new(Mutex::new(store));

    let fetcher = Arc::new(HttpFetcher::new(&config.crawler)?);
    let weights = KeywordWeights::with_overrides(&config.keywords);
    let inspector = Arc::new(KeywordScanInspector::new(weights));

    Coordinator::new(config, store, fetcher, inspector).run().await
}
