//! Turning configured and user-supplied locations into request URLs.

#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a location against the host application origin.
///
/// Root-relative paths (`/index.html`) join onto `origin`. Anything else is an
/// absolute location; a bare `host/path` entry is taken as https. Only http(s)
/// is accepted and the fragment is always dropped.
pub fn resolve(origin: &url::Url, input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut url = if trimmed.starts_with('/') && !trimmed.starts_with("//") {
        origin.join(trimmed)
    } else if trimmed.contains("://") {
        url::Url::parse(trimmed)
    } else {
        url::Url::parse(&format!("https://{trimmed}"))
    }
    .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlError::UnsupportedScheme(url.scheme().to_string()));
    }

    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> url::Url {
        url::Url::parse("http://localhost:3000").unwrap()
    }

    #[test]
    fn test_root_relative_joins_origin() {
        let url = resolve(&origin(), "/api/monastery/7#reviews").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/monastery/7");
    }

    #[test]
    fn test_absolute_keeps_query_and_drops_fragment() {
        let url = resolve(&origin(), " https://Fonts.Googleapis.com/css2?family=Inter#top ").unwrap();
        assert_eq!(url.host_str(), Some("fonts.googleapis.com"));
        assert_eq!(url.query(), Some("family=Inter"));
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_bare_host_path_defaults_to_https() {
        let url = resolve(&origin(), "cdn.jsdelivr.net/npm/leaflet").unwrap();
        assert_eq!(url.as_str(), "https://cdn.jsdelivr.net/npm/leaflet");
    }

    #[test]
    fn test_protocol_relative_is_not_root_relative() {
        let url = resolve(&origin(), "//cdn.example.org/lib.js").unwrap();
        assert_eq!(url.host_str(), Some("cdn.example.org"));
    }

    #[test]
    fn test_rejects_empty_and_other_schemes() {
        assert!(matches!(resolve(&origin(), "  "), Err(UrlError::Empty)));
        assert!(matches!(resolve(&origin(), "file:///etc/passwd"), Err(UrlError::UnsupportedScheme(_))));
    }
}
