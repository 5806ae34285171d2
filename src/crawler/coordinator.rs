//! Crawl run coordination
//!
//! A run moves through the states in [`RunState`]: the run counter is
//! advanced and the prior page map loaded (`Initialized`), a pool of worker
//! tasks drains the shared frontier (`Running`), rows the run did not touch
//! are deleted (`Sweeping`), and the run finishes (`Completed`). Storage
//! failures and cancellation abort the run before the sweep, so stale rows
//! are only ever removed on the evidence of a fully drained frontier.
//!
//! The frontier is one owned `VecDeque` behind a mutex, paired with a
//! visited set whose check-and-insert happens under the same lock guard.
//! Workers that find the queue empty only exit once nothing is in flight,
//! since an in-flight page may still enqueue children.

use crate::config::Config;
use crate::crawler::change::{self, ChangeStatus};
use crate::crawler::fetcher::{build_http_client, PageFetcher};
use crate::crawler::inspector::{CandidateLink, ContentInspector};
use crate::robots::{self, RobotsPolicy};
use crate::score::{self, KeywordWeights};
use crate::state::{PageEntry, RunState};
use crate::storage::{NewLink, StorageError, Store, SweepSummary};
use crate::url::{
    admit_candidate, canonicalize_site_url, extract_domain, resolve_link, NormalizedUrl,
    RejectReason,
};
use crate::{CrawlError, UrlError};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use url::Url;

/// Summary of a finished (or aborted) crawl run
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Terminal state the run ended in
    pub state: RunState,
    pub site_id: i64,
    pub run_id: i64,
    /// Pages fetched and recorded (changed + unchanged)
    pub pages_visited: usize,
    pub pages_changed: usize,
    pub pages_unchanged: usize,
    /// Scored links written this run
    pub links_recorded: usize,
    /// URLs given up on after fetch failure or timeout
    pub urls_failed: usize,
    /// URLs skipped by robots.txt
    pub urls_skipped: usize,
    /// Present only when the run completed and swept
    pub sweep: Option<SweepSummary>,
    /// Why the run aborted, if it did
    pub error: Option<String>,
}

#[derive(Default)]
struct Counters {
    changed: AtomicUsize,
    unchanged: AtomicUsize,
    links: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
}

/// Everything the worker tasks share for the duration of one run
struct RunContext {
    site_id: i64,
    run_id: i64,
    site_domain: String,
    config: Config,
    store: Arc<Mutex<dyn Store + Send>>,
    fetcher: Arc<dyn PageFetcher>,
    inspector: Arc<dyn ContentInspector>,
    weights: KeywordWeights,
    robots: RobotsPolicy,
    /// Prior-run page map, read-only for the whole run
    prior_pages: HashMap<String, PageEntry>,
    frontier: Mutex<VecDeque<NormalizedUrl>>,
    visited: Mutex<HashSet<String>>,
    in_flight: AtomicUsize,
    counters: Counters,
    aborted: AtomicBool,
    abort_reason: Mutex<Option<String>>,
}

impl RunContext {
    async fn record_abort(&self, reason: String) {
        let mut slot = self.abort_reason.lock().await;
        if slot.is_none() {
            *slot = Some(reason);
        }
        self.aborted.store(true, Ordering::SeqCst);
    }
}

/// Coordinates a single crawl run
pub struct Coordinator {
    config: Config,
    store: Arc<Mutex<dyn Store + Send>>,
    fetcher: Arc<dyn PageFetcher>,
    inspector: Arc<dyn ContentInspector>,
    robots: Option<RobotsPolicy>,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
}

impl Coordinator {
    pub fn new(
        config: Config,
        store: Arc<Mutex<dyn Store + Send>>,
        fetcher: Arc<dyn PageFetcher>,
        inspector: Arc<dyn ContentInspector>,
    ) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Self {
            config,
            store,
            fetcher,
            inspector,
            robots: None,
            cancel_tx: Arc::new(cancel_tx),
            cancel_rx,
        }
    }

    /// Supplies a robots policy up front instead of fetching one
    pub fn with_robots(mut self, robots: RobotsPolicy) -> Self {
        self.robots = Some(robots);
        self
    }

    /// Handle for cancelling the run from outside (e.g. on Ctrl-C)
    ///
    /// Sending `true` stops workers from picking up new frontier entries;
    /// work already in flight finishes its current page.
    pub fn cancel_handle(&self) -> Arc<watch::Sender<bool>> {
        Arc::clone(&self.cancel_tx)
    }

    /// Executes the run to a terminal state
    ///
    /// Returns `Ok` for both completed and aborted runs; the outcome's
    /// `state` and `error` fields say which. Only setup failures (bad site
    /// URL, unreachable database at startup) return `Err`.
    pub async fn run(self) -> Result<CrawlOutcome, CrawlError> {
        let mut state = RunState::Initialized;

        // Storage keys the site by the canonical form; lookups elsewhere
        // must canonicalize the same way
        let site_url = canonicalize_site_url(&self.config.site.url)?;
        let site_domain = extract_domain(&site_url).ok_or(UrlError::MissingHost)?;

        let (site_id, run_id) = self.store.lock().await.begin_run(site_url.as_str())?;
        let prior_pages = self.store.lock().await.load_pages(site_id)?;
        tracing::info!(
            "Run {} for {} ({} pages known from prior runs)",
            run_id,
            site_url,
            prior_pages.len()
        );

        let robots = match self.robots {
            Some(policy) => policy,
            None => {
                let client = build_http_client(&self.config.crawler)?;
                robots::fetch_policy(&client, &site_url).await
            }
        };

        state = advance(state, RunState::Running)?;

        let workers = self.config.crawler.workers as usize;
        let weights = KeywordWeights::with_overrides(&self.config.keywords);

        let mut frontier = VecDeque::new();
        frontier.push_back(NormalizedUrl {
            url: site_url.clone(),
            depth: 0,
        });
        let mut visited = HashSet::new();
        visited.insert(site_url.to_string());

        let ctx = Arc::new(RunContext {
            site_id,
            run_id,
            site_domain,
            config: self.config,
            store: Arc::clone(&self.store),
            fetcher: self.fetcher,
            inspector: self.inspector,
            weights,
            robots,
            prior_pages,
            frontier: Mutex::new(frontier),
            visited: Mutex::new(visited),
            in_flight: AtomicUsize::new(0),
            counters: Counters::default(),
            aborted: AtomicBool::new(false),
            abort_reason: Mutex::new(None),
        });

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let ctx = Arc::clone(&ctx);
            let cancel = self.cancel_rx.clone();
            handles.push(tokio::spawn(worker_loop(worker_id, ctx, cancel)));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker task failed: {}", e);
                ctx.record_abort(format!("worker task failed: {}", e)).await;
            }
        }

        if *self.cancel_rx.borrow() {
            ctx.record_abort("cancelled".to_string()).await;
        }

        let abort_reason = ctx.abort_reason.lock().await.take();
        let counters = &ctx.counters;
        let mut outcome = CrawlOutcome {
            state,
            site_id,
            run_id,
            pages_visited: counters.changed.load(Ordering::SeqCst)
                + counters.unchanged.load(Ordering::SeqCst),
            pages_changed: counters.changed.load(Ordering::SeqCst),
            pages_unchanged: counters.unchanged.load(Ordering::SeqCst),
            links_recorded: counters.links.load(Ordering::SeqCst),
            urls_failed: counters.failed.load(Ordering::SeqCst),
            urls_skipped: counters.skipped.load(Ordering::SeqCst),
            sweep: None,
            error: None,
        };

        if let Some(reason) = abort_reason {
            outcome.state = advance(state, RunState::Aborted)?;
            outcome.error = Some(reason.clone());
            tracing::warn!("Run {} aborted without sweeping: {}", run_id, reason);
            return Ok(outcome);
        }

        state = advance(state, RunState::Sweeping)?;
        match self.store.lock().await.sweep_stale(site_id, run_id) {
            Ok(summary) => {
                outcome.state = advance(state, RunState::Completed)?;
                outcome.sweep = Some(summary);
                tracing::info!(
                    "Run {} completed: {} pages ({} changed), {} links, swept {} pages / {} links",
                    run_id,
                    outcome.pages_visited,
                    outcome.pages_changed,
                    outcome.links_recorded,
                    summary.pages_deleted,
                    summary.links_deleted
                );
            }
            Err(e) => {
                outcome.state = advance(state, RunState::Aborted)?;
                outcome.error = Some(e.to_string());
                tracing::error!("Run {} failed during sweep: {}", run_id, e);
            }
        }

        Ok(outcome)
    }
}

fn advance(from: RunState, to: RunState) -> Result<RunState, CrawlError> {
    if from.can_transition(to) {
        Ok(to)
    } else {
        Err(CrawlError::InvalidTransition { from, to })
    }
}

/// One worker task: pop, process, repeat until the frontier stays empty
async fn worker_loop(worker_id: usize, ctx: Arc<RunContext>, cancel: watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() || ctx.aborted.load(Ordering::SeqCst) {
            break;
        }

        // Claim in-flight under the pop lock so a sibling never observes
        // an empty queue with nothing accounted for
        let job = {
            let mut frontier = ctx.frontier.lock().await;
            let job = frontier.pop_front();
            if job.is_some() {
                ctx.in_flight.fetch_add(1, Ordering::SeqCst);
            }
            job
        };
        match job {
            Some(target) => {
                let result = process_url(&ctx, &target).await;
                ctx.in_flight.fetch_sub(1, Ordering::SeqCst);

                if let Err(e) = result {
                    tracing::error!(
                        "Worker {}: storage failure on {}: {}",
                        worker_id,
                        target.url,
                        e
                    );
                    ctx.record_abort(e.to_string()).await;
                    break;
                }
            }
            None => {
                // An in-flight page may still enqueue children
                if ctx.in_flight.load(Ordering::SeqCst) == 0 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }
}

/// Runs one URL through the full pipeline
///
/// robots check, fetch, hash, change detection, (conditional) inspection
/// and scoring, persistence, child enqueueing. Fetch and inspection
/// failures are absorbed here; only storage errors propagate, because they
/// poison the run.
async fn process_url(ctx: &RunContext, target: &NormalizedUrl) -> Result<(), StorageError> {
    let url = &target.url;

    if !ctx.robots.is_allowed(url, &ctx.config.crawler.user_agent) {
        tracing::debug!("Skipping {} ({})", url, RejectReason::RobotsDisallowed);
        ctx.counters.skipped.fetch_add(1, Ordering::SeqCst);
        return Ok(());
    }

    let fetch_timeout = Duration::from_millis(ctx.config.crawler.fetch_timeout_ms);
    let page = match tokio::time::timeout(fetch_timeout, ctx.fetcher.fetch(url)).await {
        Ok(Ok(page)) => page,
        Ok(Err(e)) => {
            tracing::warn!("Giving up on {}: {}", url, e);
            ctx.counters.failed.fetch_add(1, Ordering::SeqCst);
            return Ok(());
        }
        Err(_) => {
            tracing::warn!("Giving up on {}: fetch timed out", url);
            ctx.counters.failed.fetch_add(1, Ordering::SeqCst);
            return Ok(());
        }
    };

    // Resolve every anchor once. All resolved http(s) links are offered
    // to the inspector, off-site ones included; the traversal filter only
    // decides which of them become frontier children.
    let mut resolved_links: Vec<(Url, String)> = Vec::new();
    let mut children: Vec<NormalizedUrl> = Vec::new();
    for raw in &page.links {
        let resolved = match resolve_link(&raw.href, url, &ctx.config.filter) {
            Ok(resolved) => resolved,
            Err(reason) => {
                tracing::trace!("Rejected {} ({})", raw.href, reason);
                continue;
            }
        };

        match admit_candidate(&resolved, target.depth, &ctx.site_domain, &ctx.config.filter) {
            Ok(normalized) => children.push(normalized),
            Err(reason) => tracing::trace!("Not crawling {} ({})", resolved, reason),
        }

        resolved_links.push((resolved, raw.text.clone()));
    }

    let hash = change::content_hash(&page.content);
    let prior = ctx.prior_pages.get(url.as_str());

    match change::detect(&hash, prior.map(|p| p.hash.as_str())) {
        ChangeStatus::Unchanged => {
            // The page and its stored links are current as of this run;
            // inspection is skipped entirely.
            let mut store = ctx.store.lock().await;
            let page_id = store.upsert_page(ctx.site_id, url.as_str(), &hash, ctx.run_id)?;
            store.refresh_links(page_id, ctx.run_id)?;
            drop(store);

            ctx.counters.unchanged.fetch_add(1, Ordering::SeqCst);
            tracing::debug!("Unchanged: {}", url);
        }
        ChangeStatus::Changed => {
            let inspect_candidates: Vec<CandidateLink> = resolved_links
                .iter()
                .map(|(resolved, text)| CandidateLink {
                    url: resolved.to_string(),
                    text: text.clone(),
                })
                .collect();

            let inspect_timeout = Duration::from_millis(ctx.config.crawler.inspect_timeout_ms);
            let findings = match tokio::time::timeout(
                inspect_timeout,
                ctx.inspector.inspect(url, &page.content, &inspect_candidates),
            )
            .await
            {
                Ok(Ok(findings)) => findings,
                Ok(Err(e)) => {
                    tracing::warn!("Inspection failed for {}: {}; recording zero links", url, e);
                    Vec::new()
                }
                Err(_) => {
                    tracing::warn!("Inspection timed out for {}; recording zero links", url);
                    Vec::new()
                }
            };

            // The page row must exist before any of its links
            let mut store = ctx.store.lock().await;
            let page_id = store.upsert_page(ctx.site_id, url.as_str(), &hash, ctx.run_id)?;

            let mut recorded = 0usize;
            for finding in &findings {
                if let Some(link_score) = score::aggregate_score(&finding.keywords, &ctx.weights) {
                    let keywords: Vec<&str> =
                        finding.keywords.iter().map(|(k, _)| k.as_str()).collect();
                    store.upsert_link(&NewLink {
                        site_id: ctx.site_id,
                        page_id,
                        url: finding.url.clone(),
                        text: finding.text.clone(),
                        score: link_score,
                        keywords: score::encode_keywords(&keywords),
                        run_id: ctx.run_id,
                    })?;
                    recorded += 1;
                }
            }
            drop(store);

            ctx.counters.changed.fetch_add(1, Ordering::SeqCst);
            ctx.counters.links.fetch_add(recorded, Ordering::SeqCst);
            tracing::debug!("Processed {} ({} scored links)", url, recorded);
        }
    }

    // Enqueue children; the visited check-and-insert is atomic under the
    // set's lock so two workers can never both admit the same URL.
    for normalized in children {
        let key = normalized.url.to_string();
        let mut visited = ctx.visited.lock().await;
        if visited.insert(key) {
            drop(visited);
            ctx.frontier.lock().await.push_back(normalized);
        } else {
            tracing::trace!("Rejected {} ({})", normalized.url, RejectReason::AlreadyVisited);
        }
    }

    Ok(())
}
