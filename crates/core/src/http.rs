//! Request and response types shared by the cache, the strategies, and the network boundary.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

/// Where the client intends to use the response.
///
/// Drives which offline fallback is synthesized when neither cache nor network can answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Image,
    #[default]
    Other,
}

/// An intercepted request. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub destination: Destination,
}

impl Request {
    /// Build a GET request with no destination hint.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".into(), url, destination: Destination::Other }
    }

    /// Build a request with an explicit method. The method is upper-cased.
    pub fn new(method: &str, url: Url, destination: Destination) -> Self {
        Self { method: method.to_ascii_uppercase(), url, destination }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// The URL used for cache identity: fragments never participate.
    pub fn identity_url(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.to_string()
    }
}

/// A response as returned by the network, stored in a cache region, or synthesized offline.
///
/// The body is reference-counted, so cloning a response yields an independent
/// readable copy without duplicating the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self { status, status_text: status_text.into(), headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// True for 2xx statuses; only these are ever written to a region.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup returning the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_url_drops_fragment() {
        let req = Request::get(Url::parse("https://example.com/page?a=1#top").unwrap());
        assert_eq!(req.identity_url(), "https://example.com/page?a=1");
    }

    #[test]
    fn test_method_uppercased() {
        let req = Request::new("post", Url::parse("https://example.com/").unwrap(), Destination::Other);
        assert_eq!(req.method, "POST");
        assert!(!req.is_get());
    }

    #[test]
    fn test_success_range() {
        assert!(Response::new(200, "OK", "").is_success());
        assert!(Response::new(204, "No Content", "").is_success());
        assert!(!Response::new(304, "Not Modified", "").is_success());
        assert!(!Response::new(503, "Service Unavailable", "").is_success());
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let resp = Response::new(200, "OK", "").with_header("Content-Type", "text/html");
        assert_eq!(resp.content_type(), Some("text/html"));
        assert_eq!(resp.header("x-missing"), None);
    }

    #[test]
    fn test_destination_serde() {
        let d: Destination = serde_json::from_str("\"document\"").unwrap();
        assert_eq!(d, Destination::Document);
        assert_eq!(Destination::default(), Destination::Other);
    }
}
