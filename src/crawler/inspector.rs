//! Content inspection seam
//!
//! The inspector judges which of a changed page's outbound links look
//! valuable, reporting per-keyword relevances that the scoring module
//! collapses into a single rank. The trait exists so the judgement can be
//! backed by anything from a remote model to the built-in keyword scanner;
//! the coordinator only calls it for pages whose content actually changed.

use crate::score::KeywordWeights;
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Errors from inspecting a single page
///
/// Per-URL failures: the coordinator records the page with zero links and
/// moves on. An inspection failure is never treated as "unchanged".
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Inspection failed for {url}: {message}")]
    Failed { url: String, message: String },
}

/// A normalized outbound link offered to the inspector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    /// Normalized absolute URL
    pub url: String,
    /// Anchor text the link carried
    pub text: String,
}

/// The inspector's judgement on one link
#[derive(Debug, Clone)]
pub struct LinkFindings {
    pub url: String,
    pub text: String,
    /// (keyword, relevance) pairs, relevance in [0, 1]
    ///
    /// An empty list means the link matched nothing and will not be
    /// persisted.
    pub keywords: Vec<(String, f64)>,
}

/// Seam between the coordinator and content judgement
#[async_trait]
pub trait ContentInspector: Send + Sync {
    /// Judges the candidate links of one changed page
    async fn inspect(
        &self,
        page_url: &Url,
        content: &str,
        candidates: &[CandidateLink],
    ) -> Result<Vec<LinkFindings>, InspectError>;
}

/// Built-in inspector that scans anchor text and URLs for known keywords
///
/// A keyword found in the anchor text counts as a full-relevance hit; one
/// found only in the URL counts weaker. Deterministic and offline, which
/// makes it the default backing for the binary.
pub struct KeywordScanInspector {
    weights: KeywordWeights,
}

/// Relevance for a keyword appearing only in the link URL
const URL_HIT_RELEVANCE: f64 = 0.7;

impl KeywordScanInspector {
    pub fn new(weights: KeywordWeights) -> Self {
        Self { weights }
    }
}

#[async_trait]
impl ContentInspector for KeywordScanInspector {
    async fn inspect(
        &self,
        _page_url: &Url,
        _content: &str,
        candidates: &[CandidateLink],
    ) -> Result<Vec<LinkFindings>, InspectError> {
        let mut findings = Vec::new();

        for candidate in candidates {
            let text = candidate.text.to_lowercase();
            let url = candidate.url.to_lowercase();

            let mut keywords = Vec::new();
            for keyword in self.weights.keywords() {
                if text.contains(keyword) {
                    keywords.push((keyword.to_string(), 1.0));
                } else if url.contains(keyword) {
                    keywords.push((keyword.to_string(), URL_HIT_RELEVANCE));
                }
            }

            findings.push(LinkFindings {
                url: candidate.url.clone(),
                text: candidate.text.clone(),
                keywords,
            });
        }

        Ok(findings)
    }
}
