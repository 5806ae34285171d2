//! HTTP fetcher implementation
//!
//! Defines the [`PageFetcher`] seam the coordinator crawls through, plus
//! the reqwest-backed default. A failed fetch is retried exactly once with
//! browser-like headers (some sites reject obvious crawler user agents);
//! after that the URL is given up on, so one bad page never fails the run.

use crate::config::CrawlerConfig;
use crate::crawler::parser::{extract_raw_links, RawLink};
use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors from fetching a single page
///
/// These are per-URL failures: the coordinator logs them and moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The page body
    pub content: String,
    /// Raw anchors found in the body, in document order
    pub links: Vec<RawLink>,
}

/// Seam between the coordinator and the network
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches a page and extracts its raw anchors
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// User agent sent on the fallback attempt
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:122.0) Gecko/20100101 Firefox/122.0";

/// Builds an HTTP client with the configured user agent and timeouts
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_millis(config.fetch_timeout_ms))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Default reqwest-backed fetcher
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    async fn attempt(&self, url: &Url, browser_headers: bool) -> Result<String, FetchError> {
        let mut request = self.client.get(url.clone());

        if browser_headers {
            request = request
                .header(header::USER_AGENT, BROWSER_USER_AGENT)
                .header(
                    header::ACCEPT,
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                )
                .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9");
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let content = match self.attempt(url, false).await {
            Ok(content) => content,
            Err(first) => {
                tracing::debug!(
                    "Plain fetch of {} failed ({}); retrying with browser headers",
                    url,
                    first
                );
                self.attempt(url, true).await?
            }
        };

        let links = extract_raw_links(&content);
        Ok(FetchedPage { content, links })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CrawlerConfig {
        CrawlerConfig {
            workers: 2,
            user_agent: "linkscout/0.1 (+https://example.com/bot)".to_string(),
            fetch_timeout_ms: 5_000,
            inspect_timeout_ms: 5_000,
        }
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&test_config()).is_ok());
    }

    #[test]
    fn test_new_fetcher() {
        assert!(HttpFetcher::new(&test_config()).is_ok());
    }

    // Fetch behavior (success, HTTP errors, the browser-header fallback)
    // is exercised against a mock server in the integration tests.
}
