//! Robots.txt handling module
//!
//! robots.txt is fetched once per run for the single site being crawled.
//! If it cannot be fetched or parsed, the crawl proceeds with an
//! allow-everything policy rather than failing the run.

use robotstxt::DefaultMatcher;
use reqwest::Client;
use url::Url;

/// Robots.txt permission policy for the site
///
/// Wraps the robotstxt crate's matcher behind a simplified interface.
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    /// Raw robots.txt content (empty means allow all)
    content: String,
    allow_all: bool,
}

impl RobotsPolicy {
    /// Creates a policy from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive policy that allows everything
    ///
    /// Used as the fallback when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks if a URL is allowed for the given user agent
    pub fn is_allowed(&self, url: &Url, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url.as_str())
    }
}

/// Fetches the robots.txt policy for a site
///
/// Any failure (network, non-2xx status, unreadable body) falls back to
/// [`RobotsPolicy::allow_all`].
pub async fn fetch_policy(client: &Client, site_url: &Url) -> RobotsPolicy {
    let robots_url = match site_url.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Could not build robots.txt URL for {}: {}", site_url, e);
            return RobotsPolicy::allow_all();
        }
    };

    match client.get(robots_url.clone()).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(content) => {
                tracing::debug!("Fetched robots.txt ({} bytes)", content.len());
                RobotsPolicy::from_content(&content)
            }
            Err(e) => {
                tracing::warn!("Failed to read robots.txt body: {}", e);
                RobotsPolicy::allow_all()
            }
        },
        Ok(response) => {
            tracing::debug!(
                "robots.txt returned {}; allowing all",
                response.status().as_u16()
            );
            RobotsPolicy::allow_all()
        }
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", robots_url, e);
            RobotsPolicy::allow_all()
        }
    }
}
