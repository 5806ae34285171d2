//! Link scoring module
//!
//! This module turns per-keyword relevance judgements into a single ranked
//! score per link, and handles the delimited keyword encoding used by the
//! storage layer.
//!
//! The score of a link is a geometrically decaying sum over its weighted
//! keyword relevances: the strongest signal counts in full, the second at
//! half weight, the third at a quarter, and so on. A link with many weak
//! keywords therefore cannot outrank a link with one strong one.

use std::collections::HashMap;

/// Delimiter used in the stored keyword encoding
///
/// Keywords are stored as a single padded string (";budget;rfp;") so a
/// substring match on ";kw;" finds links by keyword without a join table.
pub const KEYWORD_DELIMITER: char = ';';

/// Weight applied to keywords absent from the weight table
const UNKNOWN_KEYWORD_WEIGHT: f64 = 0.25;

/// Built-in keyword weight table
///
/// Tuned for municipal/procurement sites; config overrides take precedence.
const DEFAULT_WEIGHTS: &[(&str, f64)] = &[
    ("department", 0.7),
    ("contact", 1.0),
    ("acfr", 1.0),
    ("budget", 1.0),
    ("planning", 1.0),
    ("officer", 0.9),
    ("director", 0.9),
    ("finance", 1.0),
    ("elected", 0.7),
    ("minutes", 1.0),
    ("bid", 0.8),
    ("purchasing", 1.0),
    ("proposal", 1.0),
    ("rfp", 1.0),
    ("contract", 1.0),
    ("funding", 1.0),
    ("report", 0.7),
    ("grant", 0.7),
    ("improvement", 0.8),
    ("project", 0.8),
    ("initiative", 0.8),
];

/// Keyword weight table with a fixed fallback for unknown keywords
#[derive(Debug, Clone)]
pub struct KeywordWeights {
    weights: HashMap<String, f64>,
}

impl Default for KeywordWeights {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS
                .iter()
                .map(|(k, w)| (k.to_string(), *w))
                .collect(),
        }
    }
}

impl KeywordWeights {
    /// Builds a weight table from the built-in defaults plus config overrides
    ///
    /// Override keys are lowercased; an override for a built-in keyword
    /// replaces its default weight.
    pub fn with_overrides(overrides: &HashMap<String, f64>) -> Self {
        let mut table = Self::default();
        for (keyword, weight) in overrides {
            table.weights.insert(keyword.to_lowercase(), *weight);
        }
        table
    }

    /// Returns the weight for a keyword (case-insensitive)
    ///
    /// Unknown keywords get a low non-zero weight so novel terms still
    /// contribute without dominating curated ones.
    pub fn weight(&self, keyword: &str) -> f64 {
        self.weights
            .get(&keyword.to_lowercase())
            .copied()
            .unwrap_or(UNKNOWN_KEYWORD_WEIGHT)
    }

    /// Iterates over the known keywords
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(|k| k.as_str())
    }
}

/// Aggregates keyword relevances into a single link score
///
/// Each relevance is multiplied by its keyword's weight, the products are
/// sorted descending, and summed with geometric decay (the i-th strongest
/// contributes weighted * 2^-i). For relevances and weights within [0, 1]
/// the result is strictly below 2.0.
///
/// Returns `None` for an empty keyword list: a link the inspector found
/// nothing in is not worth persisting.
///
/// # Arguments
///
/// * `relevances` - (keyword, relevance) pairs, relevance in [0, 1]
/// * `weights` - the keyword weight table
pub fn aggregate_score(relevances: &[(String, f64)], weights: &KeywordWeights) -> Option<f64> {
    if relevances.is_empty() {
        return None;
    }

    let mut weighted: Vec<f64> = relevances
        .iter()
        .map(|(keyword, relevance)| relevance * weights.weight(keyword))
        .collect();

    weighted.sort_by(|a, b| b.total_cmp(a));

    let score = weighted
        .iter()
        .enumerate()
        .map(|(i, w)| w * 0.5_f64.powi(i as i32))
        .sum();

    Some(score)
}

/// Encodes keywords into the padded delimited form (";budget;rfp;")
///
/// Keywords are lowercased and sorted so the encoding is canonical
/// regardless of the order the inspector reported them in.
pub fn encode_keywords<S: AsRef<str>>(keywords: &[S]) -> String {
    if keywords.is_empty() {
        return String::new();
    }

    let mut normalized: Vec<String> = keywords
        .iter()
        .map(|k| k.as_ref().to_lowercase())
        .collect();
    normalized.sort();
    normalized.dedup();

    let mut encoded = String::new();
    encoded.push(KEYWORD_DELIMITER);
    for keyword in &normalized {
        encoded.push_str(keyword);
        encoded.push(KEYWORD_DELIMITER);
    }
    encoded
}

/// Decodes the padded delimited keyword form back into a list
pub fn decode_keywords(encoded: &str) -> Vec<String> {
    encoded
        .split(KEYWORD_DELIMITER)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
