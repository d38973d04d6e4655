//! services/api/src/adapters/fetcher.rs
//!
//! This module contains the HTTP adapter used by the link resolver.
//! It implements the `PageFetcher` port from the `core` crate with a `reqwest`
//! client that never follows redirects on its own and looks like a browser.

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, LOCATION},
    redirect::Policy,
    Client, Response,
};
use roadmap_core::ports::{FetchedPage, PageFetcher, PortError, PortResult};
use std::time::Duration;
use tracing::debug;

/// Share endpoints only answer with the real redirect to browser-like clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120 Safari/537.36";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
/// Upper bound on the HTML kept per hop.
pub const MAX_HTML_BYTES: usize = 2 * 1024 * 1024;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `PageFetcher` with a redirect-less `reqwest` client.
#[derive(Clone)]
pub struct ReqwestPageFetcher {
    client: Client,
}

impl ReqwestPageFetcher {
    /// Builds the dedicated client. `timeout_secs` bounds every single hop.
    pub fn new(timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("pl,en;q=0.8"));

        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .redirect(Policy::none())
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .build()?;
        Ok(Self { client })
    }
}

//=========================================================================================
// `PageFetcher` Trait Implementation
//=========================================================================================

#[async_trait]
impl PageFetcher for ReqwestPageFetcher {
    /// Issues one GET. Only HTML bodies are downloaded.
    async fn fetch(&self, url: &str) -> PortResult<FetchedPage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let mut page = FetchedPage {
            status: response.status().as_u16(),
            location: header(LOCATION),
            content_type: header(CONTENT_TYPE),
            body: String::new(),
        };

        if page.is_html() {
            page.body = read_capped(response, MAX_HTML_BYTES).await?;
        }
        Ok(page)
    }
}

/// Reads at most `limit` bytes of the body; the rest is never downloaded.
async fn read_capped(mut response: Response, limit: usize) -> PortResult<String> {
    let mut body: Vec<u8> = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?
    {
        let room = limit - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            debug!("HTML body cut at {} bytes", limit);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}
