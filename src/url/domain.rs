use url::Url;

/// Extracts the lowercase host from a URL
///
/// Returns None if the URL has no host (which cannot happen for valid
/// HTTP(S) URLs).
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://city.example.gov/").unwrap();
        assert_eq!(extract_domain(&url), Some("city.example.gov".to_string()));
    }

    #[test]
    fn test_extract_lowercases_host() {
        let url = Url::parse("https://CITY.Example.GOV/budget").unwrap();
        assert_eq!(extract_domain(&url), Some("city.example.gov".to_string()));
    }

    #[test]
    fn test_extract_ignores_port_and_path() {
        let url = Url::parse("http://localhost:8080/page?q=1").unwrap();
        assert_eq!(extract_domain(&url), Some("localhost".to_string()));
    }
}
