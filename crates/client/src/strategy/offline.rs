//! Responses synthesized when neither cache nor network can answer.
//!
//! Documents and images get a 200 so the client renders something instead of
//! escalating to its own error screen; everything else gets a plain 503.

use cloister_core::config::OfflineConfig;
use cloister_core::{Destination, Request, Response};

#[derive(Debug, Clone)]
pub struct OfflineFallback {
    title: String,
    width: u32,
    height: u32,
}

impl Default for OfflineFallback {
    fn default() -> Self {
        Self::from_config(&OfflineConfig::default())
    }
}

impl OfflineFallback {
    pub fn from_config(config: &OfflineConfig) -> Self {
        Self { title: config.title.clone(), width: config.image_width, height: config.image_height }
    }

    /// Pick the fallback matching the request's destination hint.
    pub fn respond(&self, request: &Request) -> Response {
        match request.destination {
            Destination::Document => self.document(),
            Destination::Image => self.image(),
            Destination::Other => Self::unavailable(),
        }
    }

    fn document(&self) -> Response {
        let title = escape_html(&self.title);
        let body = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} - Offline</title>
<style>
body {{ font-family: system-ui, sans-serif; display: flex; align-items: center; justify-content: center; min-height: 100vh; margin: 0; background: #f7f3ec; color: #3b2f2f; }}
main {{ text-align: center; padding: 2rem; max-width: 28rem; }}
button {{ margin-top: 1rem; padding: 0.6rem 1.4rem; border: 0; border-radius: 0.4rem; background: #8b5a2b; color: #fff; cursor: pointer; }}
</style>
</head>
<body>
<main>
<h1>You are offline</h1>
<p>{title} cannot reach the network right now. Pages you have already visited are still available.</p>
<button onclick="location.reload()">Try again</button>
</main>
</body>
</html>
"#
        );

        Response::new(200, "OK", body)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_header("cache-control", "no-store")
    }

    fn image(&self) -> Response {
        let (w, h) = (self.width, self.height);
        let body = format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="{w}" height="{h}" fill="#e8e2d6"/><text x="50%" y="50%" dominant-baseline="middle" text-anchor="middle" font-family="sans-serif" font-size="18" fill="#7a6a58">Image unavailable offline</text></svg>"##
        );

        Response::new(200, "OK", body)
            .with_header("content-type", "image/svg+xml")
            .with_header("cache-control", "no-store")
    }

    fn unavailable() -> Response {
        Response::new(503, "Service Unavailable", "Offline - resource unavailable")
            .with_header("content-type", "text/plain; charset=utf-8")
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
