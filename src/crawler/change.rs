//! Content change detection
//!
//! A page is re-processed only when its content hash differs from the hash
//! recorded on a previous run. Hash collisions silently suppress
//! re-processing; that risk is accepted for a SHA-256 digest.

use sha2::{Digest, Sha256};

/// Outcome of comparing a page's content hash against the prior run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    /// New page, or content differs from the stored hash
    Changed,
    /// Content is byte-identical to what the prior run saw
    Unchanged,
}

/// Computes the hex-encoded SHA-256 hash of page content
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compares a freshly computed hash against the prior run's hash
///
/// No prior hash means the page is new, which counts as changed. The
/// comparison is pure, so re-running it within a run is harmless.
pub fn detect(new_hash: &str, prior_hash: Option<&str>) -> ChangeStatus {
    match prior_hash {
        Some(prior) if prior == new_hash => ChangeStatus::Unchanged,
        _ => ChangeStatus::Changed,
    }
}
