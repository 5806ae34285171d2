//! URL normalization and traversal filtering
//!
//! Link handling happens in two stages. [`resolve_link`] turns a raw href
//! into an absolute http(s) URL; every resolved link is offered to the
//! inspector, including links pointing off the site. [`admit_candidate`]
//! then applies the traversal filters that gate the frontier: only
//! on-domain links within the depth and path limits get crawled. Both
//! functions are pure; visited-set and robots checks are layered on top by
//! the coordinator, reusing the same [`RejectReason`] type.

use crate::config::FilterConfig;
use crate::url::extract_domain;
use crate::UrlError;
use std::fmt;
use url::Url;

/// A candidate URL that survived normalization and filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    /// The normalized absolute URL
    pub url: Url,
    /// Link depth from the site root (parent depth + 1)
    pub depth: u32,
}

/// Why a candidate URL was not admitted to the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The href could not be resolved into a URL
    Malformed(String),
    /// Non-http(s) scheme (mailto:, javascript:, ftp:, ...)
    Scheme(String),
    /// Host differs from the site being crawled
    OffDomain(String),
    /// Path has more segments than the configured limit
    PathTooLong { segments: usize, max: usize },
    /// Link depth exceeds the configured limit
    TooDeep { depth: u32, max: u32 },
    /// URL was already seen this run
    AlreadyVisited,
    /// robots.txt disallows this path
    RobotsDisallowed,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(msg) => write!(f, "malformed ({})", msg),
            Self::Scheme(scheme) => write!(f, "unsupported scheme '{}'", scheme),
            Self::OffDomain(host) => write!(f, "off-domain host '{}'", host),
            Self::PathTooLong { segments, max } => {
                write!(f, "path too long ({} segments, max {})", segments, max)
            }
            Self::TooDeep { depth, max } => write!(f, "too deep (depth {}, max {})", depth, max),
            Self::AlreadyVisited => write!(f, "already visited"),
            Self::RobotsDisallowed => write!(f, "disallowed by robots.txt"),
        }
    }
}

/// Resolves a discovered href into an absolute http(s) URL
///
/// # Normalization steps
///
/// 1. Resolve the href against the page it was found on
/// 2. Reject non-http(s) schemes and host-less URLs
/// 3. Strip the fragment
/// 4. Truncate query parameters beyond the configured limit, keeping the
///    first ones in document order (the leading parameter usually selects
///    the resource; the tail is tracking noise)
///
/// Every link that survives resolution is a candidate for inspection,
/// whether or not the traversal filter later admits it to the frontier.
pub fn resolve_link(href: &str, base: &Url, filter: &FilterConfig) -> Result<Url, RejectReason> {
    let href = href.trim();
    if href.is_empty() {
        return Err(RejectReason::Malformed("empty href".to_string()));
    }

    let mut url = base
        .join(href)
        .map_err(|e| RejectReason::Malformed(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(RejectReason::Scheme(url.scheme().to_string()));
    }
    if url.host_str().is_none() {
        return Err(RejectReason::Malformed("missing host".to_string()));
    }

    url.set_fragment(None);

    truncate_query(&mut url, filter.max_query_params);

    Ok(url)
}

/// Applies the traversal filters that gate frontier admission
///
/// # Filters
///
/// 1. Reject hosts other than the site's
/// 2. Reject paths with more segments than the limit (truncating a path
///    would change which resource it names, so excess length is fatal)
/// 3. Reject candidates deeper than the depth limit
///
/// # Arguments
///
/// * `url` - A link that already passed [`resolve_link`]
/// * `parent_depth` - Depth of the page the link was found on
/// * `site_domain` - Lowercase host of the site being crawled
/// * `filter` - The traversal limits
pub fn admit_candidate(
    url: &Url,
    parent_depth: u32,
    site_domain: &str,
    filter: &FilterConfig,
) -> Result<NormalizedUrl, RejectReason> {
    match extract_domain(url) {
        Some(host) if host == site_domain => {}
        Some(host) => return Err(RejectReason::OffDomain(host)),
        None => return Err(RejectReason::Malformed("missing host".to_string())),
    }

    let segments = count_path_segments(url.path());
    if segments > filter.max_path_segments {
        return Err(RejectReason::PathTooLong {
            segments,
            max: filter.max_path_segments,
        });
    }

    let depth = parent_depth + 1;
    if depth > filter.max_depth {
        return Err(RejectReason::TooDeep {
            depth,
            max: filter.max_depth,
        });
    }

    Ok(NormalizedUrl {
        url: url.clone(),
        depth,
    })
}

/// Resolves an href and gates it for the frontier in one step
pub fn normalize_candidate(
    href: &str,
    base: &Url,
    parent_depth: u32,
    site_domain: &str,
    filter: &FilterConfig,
) -> Result<NormalizedUrl, RejectReason> {
    let url = resolve_link(href, base, filter)?;
    admit_candidate(&url, parent_depth, site_domain, filter)
}

/// Parses and canonicalizes a site root URL
///
/// Storage keys sites by the canonical string form of the parsed URL
/// (lowercased host, explicit path, default port dropped), so the crawl
/// write path and every later lookup must both go through here.
pub fn canonicalize_site_url(raw: &str) -> Result<Url, UrlError> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }
    Ok(url)
}

/// Keeps only the first `max` query parameters, in document order
///
/// Operates on the raw query string so parameter encoding is preserved
/// exactly as the page author wrote it.
fn truncate_query(url: &mut Url, max: usize) {
    let query = match url.query() {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => {
            url.set_query(None);
            return;
        }
    };

    let params: Vec<&str> = query.split('&').collect();
    if params.len() <= max {
        return;
    }

    if max == 0 {
        url.set_query(None);
    } else {
        url.set_query(Some(&params[..max].join("&")));
    }
}

/// Counts non-empty path segments
fn count_path_segments(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}
