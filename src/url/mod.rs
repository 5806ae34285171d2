//! URL handling module
//!
//! Provides domain extraction, site-URL canonicalization, and the
//! two-stage link handling applied to every discovered href: resolution
//! into an absolute URL, then traversal filtering for frontier admission.

mod domain;
mod normalize;

pub use domain::extract_domain;
pub use normalize::{
    admit_candidate, canonicalize_site_url, normalize_candidate, resolve_link, NormalizedUrl,
    RejectReason,
};
