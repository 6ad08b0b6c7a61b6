//! Request identity keys.

use sha2::{Digest, Sha256};

use crate::http::Request;

/// Compute the request-identity key used for cache lookups.
///
/// Derived from method and URL only; the destination hint does not participate.
pub fn compute_request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Request-identity key for an intercepted request.
pub fn request_key(request: &Request) -> String {
    compute_request_key(&request.method, &request.identity_url())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Destination;
    use url::Url;

    #[test]
    fn test_key_stability() {
        let key1 = compute_request_key("GET", "https://example.com/");
        let key2 = compute_request_key("GET", "https://example.com/");
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_different_method() {
        let get = compute_request_key("GET", "https://example.com/");
        let head = compute_request_key("HEAD", "https://example.com/");
        assert_ne!(get, head);
    }

    #[test]
    fn test_key_ignores_destination_and_fragment() {
        let url = Url::parse("https://example.com/logo.png").unwrap();
        let plain = Request::get(url.clone());
        let image = Request::get(Url::parse("https://example.com/logo.png#x").unwrap()).with_destination(Destination::Image);
        assert_eq!(request_key(&plain), request_key(&image));
    }

    #[test]
    fn test_key_format() {
        let key = compute_request_key("GET", "https://example.com/");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
