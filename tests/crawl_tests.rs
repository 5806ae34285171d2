//! End-to-end crawl tests against a mock HTTP server
//!
//! These drive the public `crawl` entry point with the real HTTP fetcher,
//! so they cover the network path the unit tests mock out: robots.txt
//! fetching, the browser-header fallback, and incremental behavior across
//! runs against one on-disk database.

use linkscout::config::{Config, CrawlerConfig, FilterConfig, SiteConfig, StorageConfig};
use linkscout::crawler::crawl;
use linkscout::storage::{open_store, SiteRecord, SqliteStore, Store};
use linkscout::url::canonicalize_site_url;
use linkscout::RunState;
use std::collections::HashMap;
use tempfile::TempDir;
use wiremock::matchers::{headers, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(site_url: &str, db_path: &str) -> Config {
    Config {
        site: SiteConfig {
            url: site_url.to_string(),
        },
        crawler: CrawlerConfig {
            workers: 2,
            user_agent: "linkscout-test/0.1".to_string(),
            fetch_timeout_ms: 5_000,
            inspect_timeout_ms: 5_000,
        },
        filter: FilterConfig {
            max_depth: 5,
            max_query_params: 2,
            max_path_segments: 8,
        },
        storage: StorageConfig {
            database_path: db_path.to_string(),
        },
        keywords: HashMap::new(),
    }
}

/// Sites are stored under the canonical form of the configured URL
fn lookup_site(store: &SqliteStore, config: &Config) -> SiteRecord {
    let canonical = canonicalize_site_url(&config.site.url).unwrap();
    store.get_site_by_url(canonical.as_str()).unwrap().unwrap()
}

fn db_path(dir: &TempDir) -> String {
    dir.path().join("crawl.db").to_string_lossy().into_owned()
}

async fn mount_page(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(html.to_string()))
        .mount(server)
        .await;
}

const ROOT_HTML: &str = r#"<html><body>
    <a href="/departments">Departments</a>
    <a href="/budget">Annual Budget</a>
</body></html>"#;

const DEPARTMENTS_HTML: &str = r#"<html><body>
    <a href="/budget">Budget Office</a>
    <a href="/contact">Contact Us</a>
</body></html>"#;

const BUDGET_HTML: &str = r#"<html><body>
    <a href="/budget/acfr-2025.pdf">2025 ACFR</a>
    <a href="/budget/rfp-listing">Open RFPs</a>
</body></html>"#;

const CONTACT_HTML: &str = r#"<html><body><p>City Hall, Main St.</p></body></html>"#;

async fn mount_site(server: &MockServer) {
    mount_page(server, "/", ROOT_HTML).await;
    mount_page(server, "/departments", DEPARTMENTS_HTML).await;
    mount_page(server, "/budget", BUDGET_HTML).await;
    mount_page(server, "/contact", CONTACT_HTML).await;
}

#[tokio::test]
async fn test_crawl_populates_pages_and_scored_links() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), &db_path(&dir));

    let outcome = crawl(config.clone()).await.unwrap();
    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.run_id, 1);
    assert_eq!(outcome.pages_visited, 4);
    assert!(outcome.links_recorded > 0);

    let store = open_store(&config.storage.database_path).unwrap();
    let site = lookup_site(&store, &config);
    assert_eq!(site.run_id, 1);
    assert_eq!(store.count_pages(site.id).unwrap(), 4);

    let links = store.list_links_for_site(site.id).unwrap();
    assert!(!links.is_empty());
    // Best links first, and keyword matches are queryable by substring
    for pair in links.windows(2) {
        assert!(pair[0].link.score >= pair[1].link.score);
    }
    assert!(links.iter().any(|l| l.link.keywords.contains(";budget;")));
    assert!(links.iter().any(|l| l.link.keywords.contains(";rfp;")));
}

#[tokio::test]
async fn test_second_run_skips_unchanged_and_keeps_links() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), &db_path(&dir));

    let first = crawl(config.clone()).await.unwrap();
    assert_eq!(first.state, RunState::Completed);
    let links_after_first = first.links_recorded;
    assert!(links_after_first > 0);

    let second = crawl(config.clone()).await.unwrap();
    assert_eq!(second.state, RunState::Completed);
    assert_eq!(second.run_id, 2);
    assert_eq!(second.pages_unchanged, 4);
    assert_eq!(second.pages_changed, 0);
    // Nothing went stale: all links were refreshed, none re-recorded
    assert_eq!(second.links_recorded, 0);
    let sweep = second.sweep.unwrap();
    assert_eq!(sweep.pages_deleted, 0);
    assert_eq!(sweep.links_deleted, 0);

    let store = open_store(&config.storage.database_path).unwrap();
    let site = lookup_site(&store, &config);
    assert_eq!(store.count_links(site.id).unwrap(), links_after_first as u64);
    for record in store.list_links_for_site(site.id).unwrap() {
        assert_eq!(record.link.run_id, 2);
    }
}

#[tokio::test]
async fn test_removed_page_and_links_swept_on_next_run() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), &db_path(&dir));

    let first = crawl(config.clone()).await.unwrap();
    assert_eq!(first.pages_visited, 4);

    // The budget section disappears: root drops its link and the page 404s
    server.reset().await;
    let root_without_budget = r#"<html><body>
        <a href="/departments">Departments</a>
    </body></html>"#;
    let departments_without_budget = r#"<html><body>
        <a href="/contact">Contact Us</a>
    </body></html>"#;
    mount_page(&server, "/", root_without_budget).await;
    mount_page(&server, "/departments", departments_without_budget).await;
    mount_page(&server, "/contact", CONTACT_HTML).await;

    let second = crawl(config.clone()).await.unwrap();
    assert_eq!(second.state, RunState::Completed);
    let sweep = second.sweep.unwrap();
    assert_eq!(sweep.pages_deleted, 1);

    let store = open_store(&config.storage.database_path).unwrap();
    let site = lookup_site(&store, &config);
    let urls: Vec<String> = store
        .list_pages(site.id)
        .unwrap()
        .into_iter()
        .map(|p| p.url)
        .collect();
    assert!(!urls.iter().any(|u| u.ends_with("/budget")));
    // The budget page's ACFR and RFP links went with it
    let links = store.list_links_for_site(site.id).unwrap();
    assert!(!links.iter().any(|l| l.link.url.contains("acfr")));
}

#[tokio::test]
async fn test_robots_txt_disallow_respected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /departments\n"),
        )
        .mount(&server)
        .await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), &db_path(&dir));

    let outcome = crawl(config.clone()).await.unwrap();
    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.urls_skipped, 1);

    let store = open_store(&config.storage.database_path).unwrap();
    let site = lookup_site(&store, &config);
    let urls: Vec<String> = store
        .list_pages(site.id)
        .unwrap()
        .into_iter()
        .map(|p| p.url)
        .collect();
    assert!(!urls.iter().any(|u| u.ends_with("/departments")));
}

#[tokio::test]
async fn test_browser_header_fallback_on_rejected_user_agent() {
    let server = MockServer::start().await;

    // Plain requests get 403; the Firefox-looking retry succeeds
    Mock::given(method("GET"))
        .and(path("/"))
        .and(headers("accept-language", vec!["en-US", "en;q=0.9"]))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<a href="/budget">Annual Budget</a>"#.to_string()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/budget"))
        .and(headers("accept-language", vec!["en-US", "en;q=0.9"]))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>figures</body></html>"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), &db_path(&dir));

    let outcome = crawl(config.clone()).await.unwrap();
    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.urls_failed, 0);
    assert!(outcome.pages_visited >= 2);
}

#[tokio::test]
async fn test_dead_link_does_not_fail_run() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/budget">Annual Budget</a>
            <a href="/missing">Gone</a>
        </body></html>"#,
    )
    .await;
    mount_page(&server, "/budget", "<html><body>budget detail</body></html>").await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), &db_path(&dir));

    let outcome = crawl(config.clone()).await.unwrap();
    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.urls_failed, 1);
    assert!(outcome.pages_visited >= 2);
}

#[tokio::test]
async fn test_keyword_overrides_change_ranking() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/a">Department Overview</a>
            <a href="/b">Annual Budget</a>
        </body></html>"#,
    )
    .await;
    mount_page(&server, "/a", "<html><body>a</body></html>").await;
    mount_page(&server, "/b", "<html><body>b</body></html>").await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server.uri(), &db_path(&dir));
    // Invert the default ordering: departments outrank budgets
    config.keywords.insert("department".to_string(), 1.0);
    config.keywords.insert("budget".to_string(), 0.3);

    let outcome = crawl(config.clone()).await.unwrap();
    assert_eq!(outcome.state, RunState::Completed);

    let store = open_store(&config.storage.database_path).unwrap();
    let site = lookup_site(&store, &config);
    let links = store.list_links_for_site(site.id).unwrap();
    let best = &links[0].link;
    assert!(best.keywords.contains(";department;"));
}

#[tokio::test]
async fn test_site_found_under_canonical_url_after_crawl() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), &db_path(&dir));
    // wiremock URIs carry no trailing slash; the stored form does
    assert!(!config.site.url.ends_with('/'));

    let outcome = crawl(config.clone()).await.unwrap();
    assert_eq!(outcome.state, RunState::Completed);

    let store = open_store(&config.storage.database_path).unwrap();
    let canonical = canonicalize_site_url(&config.site.url).unwrap();
    let site = store.get_site_by_url(canonical.as_str()).unwrap();
    assert!(site.is_some());
    assert_eq!(site.unwrap().url, canonical.as_str());
}

#[tokio::test]
async fn test_offsite_links_inspected_and_recorded() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="https://archive.example.org/acfr-2025.pdf">2025 ACFR</a>
            <a href="/contact">Contact Us</a>
        </body></html>"#,
    )
    .await;
    mount_page(&server, "/contact", CONTACT_HTML).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), &db_path(&dir));

    let outcome = crawl(config.clone()).await.unwrap();
    assert_eq!(outcome.state, RunState::Completed);
    // Only on-site pages are crawled
    assert_eq!(outcome.pages_visited, 2);
    assert_eq!(outcome.urls_failed, 0);

    let store = open_store(&config.storage.database_path).unwrap();
    let site = lookup_site(&store, &config);
    assert_eq!(store.count_pages(site.id).unwrap(), 2);

    // The off-site document still ranks
    let links = store.list_links_for_site(site.id).unwrap();
    assert!(links
        .iter()
        .any(|l| l.link.url == "https://archive.example.org/acfr-2025.pdf"));
}
