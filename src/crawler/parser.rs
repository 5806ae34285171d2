//! HTML parsing for link extraction
//!
//! Extracts raw anchors (href plus anchor text) from fetched pages.
//! Resolution against the page URL and all traversal filtering happen
//! later in [`crate::url::normalize_candidate`]; this module only reads
//! the document.

use scraper::{Html, Selector};

/// A raw anchor as found in the page, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLink {
    /// The href attribute, verbatim
    pub href: String,
    /// The anchor's visible text, whitespace-trimmed
    pub text: String,
}

/// Extracts all anchors with an href from HTML content
///
/// Skipped outright because they can never become crawlable URLs:
/// - `javascript:`, `mailto:`, `tel:` and `data:` hrefs
/// - fragment-only hrefs (same-page anchors)
/// - anchors with the `download` attribute
/// - empty hrefs
pub fn extract_raw_links(html: &str) -> Vec<RawLink> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return links,
    };

    for element in document.select(&selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        let href = match element.value().attr("href") {
            Some(h) => h.trim(),
            None => continue,
        };

        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("data:")
        {
            continue;
        }

        let text = element.text().collect::<String>().trim().to_string();

        links.push(RawLink {
            href: href.to_string(),
            text,
        });
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_anchor_with_text() {
        let html = r#"<html><body><a href="/budget">Annual Budget</a></body></html>"#;
        let links = extract_raw_links(html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "/budget");
        assert_eq!(links[0].text, "Annual Budget");
    }

    #[test]
    fn test_anchor_text_trimmed_and_flattened() {
        let html = r#"<a href="/rfp">  Current <b>RFPs</b>  </a>"#;
        let links = extract_raw_links(html);
        assert_eq!(links[0].text, "Current RFPs");
    }

    #[test]
    fn test_skip_javascript_mailto_tel_data() {
        let html = r#"
            <a href="javascript:void(0)">JS</a>
            <a href="mailto:clerk@example.gov">Mail</a>
            <a href="tel:+15551234567">Call</a>
            <a href="data:text/html,hi">Data</a>
        "#;
        assert!(extract_raw_links(html).is_empty());
    }

    #[test]
    fn test_skip_fragment_only() {
        let html = r##"<a href="#top">Back to top</a>"##;
        assert!(extract_raw_links(html).is_empty());
    }

    #[test]
    fn test_skip_download_attribute() {
        let html = r#"<a href="/file.pdf" download>Download</a>"#;
        assert!(extract_raw_links(html).is_empty());
    }

    #[test]
    fn test_skip_empty_href() {
        let html = r#"<a href="  ">Blank</a>"#;
        assert!(extract_raw_links(html).is_empty());
    }

    #[test]
    fn test_multiple_links_in_document_order() {
        let html = r#"
            <html><body>
                <a href="/one">One</a>
                <a href="https://city.example.gov/two">Two</a>
                <a href="three.html">Three</a>
            </body></html>
        "#;
        let links = extract_raw_links(html);
        let hrefs: Vec<&str> = links.iter().map(|l| l.href.as_str()).collect();
        assert_eq!(hrefs, vec!["/one", "https://city.example.gov/two", "three.html"]);
    }

    #[test]
    fn test_mixed_valid_and_skipped() {
        let html = r#"
            <a href="/keep">Keep</a>
            <a href="mailto:x@y.z">Skip</a>
            <a href="/also-keep">Also</a>
        "#;
        assert_eq!(extract_raw_links(html).len(), 2);
    }
}
