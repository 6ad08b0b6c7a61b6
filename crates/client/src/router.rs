//! Request classification.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. Same origin as the host application: cache-first.
//! 2. Cross-origin but the URL contains an absolute static-asset entry: cache-first.
//! 3. Path matches a dynamic pattern (API, content, image extension): network-first.
//! 4. Anything else: stale-while-revalidate.
//!
//! Only GET is intercepted. Every other method passes through untouched.

use cloister_core::{AppConfig, Error, Request};
use regex::RegexSet;
use url::{Origin, Url};

use crate::strategy::Strategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Let the request proceed to the network unmodified.
    Passthrough,
    Intercept(Strategy),
}

#[derive(Debug, Clone)]
pub struct Router {
    origin: Origin,
    allowlist: Vec<String>,
    dynamic: RegexSet,
}

impl Router {
    /// Build a router.
    ///
    /// Root-relative static-asset entries are ignored for the allowlist rule;
    /// they can only name same-origin resources, which rule 1 already covers.
    /// Every other entry, with or without a scheme, is matched as a substring.
    pub fn new(origin: &Url, static_assets: &[String], dynamic_patterns: &[String]) -> Result<Self, Error> {
        let allowlist = static_assets
            .iter()
            .map(|asset| asset.trim())
            .filter(|asset| !asset.is_empty() && !asset.starts_with('/'))
            .map(str::to_string)
            .collect();

        let dynamic = RegexSet::new(dynamic_patterns)
            .map_err(|e| Error::InvalidInput(format!("invalid dynamic pattern: {e}")))?;

        Ok(Self { origin: origin.origin(), allowlist, dynamic })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidInput(e.to_string()))?;
        Self::new(&origin, &config.static_assets, &config.dynamic_patterns)
    }

    pub fn classify(&self, request: &Request) -> Route {
        if !request.is_get() {
            return Route::Passthrough;
        }

        if request.url.origin() == self.origin {
            return Route::Intercept(Strategy::CacheFirst);
        }

        let url = request.url.as_str();
        if self.allowlist.iter().any(|asset| url.contains(asset.as_str())) {
            return Route::Intercept(Strategy::CacheFirst);
        }

        if self.dynamic.is_match(request.url.path()) {
            return Route::Intercept(Strategy::NetworkFirst);
        }

        Route::Intercept(Strategy::StaleWhileRevalidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloister_core::Destination;

    fn router() -> Router {
        Router::from_config(&AppConfig::default()).unwrap()
    }

    fn classify(method: &str, url: &str) -> Route {
        router().classify(&Request::new(method, Url::parse(url).unwrap(), Destination::Other))
    }

    #[test]
    fn test_non_get_passes_through() {
        for method in ["POST", "PUT", "DELETE", "PATCH", "HEAD"] {
            assert_eq!(classify(method, "http://localhost:3000/api/monastery-visits"), Route::Passthrough);
            assert_eq!(classify(method, "https://cdn.example.org/x.js"), Route::Passthrough);
        }
    }

    #[test]
    fn test_same_origin_is_cache_first_even_for_api_paths() {
        assert_eq!(classify("GET", "http://localhost:3000/"), Route::Intercept(Strategy::CacheFirst));
        assert_eq!(
            classify("GET", "http://localhost:3000/api/monastery/1"),
            Route::Intercept(Strategy::CacheFirst)
        );
    }

    #[test]
    fn test_other_port_is_not_same_origin() {
        assert_eq!(
            classify("GET", "http://localhost:4000/api/monastery/1"),
            Route::Intercept(Strategy::NetworkFirst)
        );
    }

    #[test]
    fn test_allowlisted_cross_origin_asset_is_cache_first() {
        let url = "https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700&display=swap";
        assert_eq!(classify("GET", url), Route::Intercept(Strategy::CacheFirst));
    }

    #[test]
    fn test_relative_assets_do_not_allowlist_cross_origin() {
        assert_eq!(
            classify("GET", "https://cdn.example.org/index.html"),
            Route::Intercept(Strategy::StaleWhileRevalidate)
        );
    }

    #[test]
    fn test_scheme_less_allowlist_entry_is_cache_first() {
        let origin = Url::parse("http://localhost:3000").unwrap();
        let assets = ["/".to_string(), "cdn.jsdelivr.net/npm/leaflet".to_string()];
        let router = Router::new(&origin, &assets, &[]).unwrap();

        let request = Request::get(Url::parse("https://cdn.jsdelivr.net/npm/leaflet/dist/leaflet.js").unwrap());
        assert_eq!(router.classify(&request), Route::Intercept(Strategy::CacheFirst));

        let other = Request::get(Url::parse("https://cdn.jsdelivr.net/npm/lodash/lodash.js").unwrap());
        assert_eq!(router.classify(&other), Route::Intercept(Strategy::StaleWhileRevalidate));
    }

    #[test]
    fn test_dynamic_patterns_are_network_first() {
        assert_eq!(classify("GET", "https://api.example.org/api/chat-messages"), Route::Intercept(Strategy::NetworkFirst));
        assert_eq!(classify("GET", "https://media.example.org/monastery/7"), Route::Intercept(Strategy::NetworkFirst));
        assert_eq!(classify("GET", "https://media.example.org/photos/a.jpg"), Route::Intercept(Strategy::NetworkFirst));
        assert_eq!(classify("GET", "https://media.example.org/photos/a.svg?v=2"), Route::Intercept(Strategy::NetworkFirst));
    }

    #[test]
    fn test_extension_match_is_case_sensitive_and_anchored() {
        assert_eq!(
            classify("GET", "https://media.example.org/photos/a.JPG"),
            Route::Intercept(Strategy::StaleWhileRevalidate)
        );
        assert_eq!(
            classify("GET", "https://media.example.org/photos/a.png.html"),
            Route::Intercept(Strategy::StaleWhileRevalidate)
        );
    }

    #[test]
    fn test_everything_else_is_stale_while_revalidate() {
        assert_eq!(
            classify("GET", "https://cdn.example.org/lib.js"),
            Route::Intercept(Strategy::StaleWhileRevalidate)
        );
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let origin = Url::parse("http://localhost:3000").unwrap();
        let result = Router::new(&origin, &[], &["(".to_string()]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
