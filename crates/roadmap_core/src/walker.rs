//! crates/roadmap_core/src/walker.rs
//!
//! The Redirect Walker. Follows a share link hop by hop (HTTP redirects,
//! canonical links, meta refreshes, script redirects and URL wrappers) until it
//! reaches a URL that carries coordinates or runs out of ways to advance.
//!
//! The walk is a state machine with a single `Following(url)` state. Each
//! iteration evaluates the transition rules in a fixed order and either
//! follows a new URL or stops. At most `max_hops` iterations run, and each
//! iteration issues at most one request.

use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};
use url::Url;

use crate::domain::WalkOutcome;
use crate::extract::{extract_from_url, unescape_markup};
use crate::ports::{FetchedPage, PageFetcher};

pub const DEFAULT_MAX_HOPS: usize = 10;

/// Query parameters that carry the destination of a redirect wrapper.
const WRAPPER_PARAMS: [&str; 2] = ["q", "url"];

/// What the current iteration decided.
#[derive(Debug, PartialEq)]
enum Transition {
    Follow(String),
    Stop,
}

/// Ordered escape hatches scanned in a fetched HTML page.
static CANONICAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link[^>]+rel=["']canonical["'][^>]*href=["']([^"']+)["']"#).unwrap()
});
static CANONICAL_HREF_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link[^>]+href=["']([^"']+)["'][^>]*rel=["']canonical["']"#).unwrap()
});
static META_REFRESH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)http-equiv=["']?refresh["']?[^>]*content=["'][^"']*?url\s*=\s*'?([^"'>]+)"#)
        .unwrap()
});
static JS_ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\blocation(?:\.href)?\s*=\s*["']([^"']+)["']"#).unwrap()
});
static JS_REPLACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\blocation\.replace\(\s*["']([^"']+)["']\s*\)"#).unwrap()
});
static MAPS_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)https?://(?:www\.google\.[a-z.]+/maps|maps\.google\.[a-z.]+/|maps\.app\.goo\.gl/|goo\.gl/maps/)[^"'\s<>\\]*"#,
    )
    .unwrap()
});
static WRAPPER_PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:url|q)=(https?(?::|%3A)[^&"'<>\s]+)"#).unwrap()
});

/// Walks redirect chains through a [`PageFetcher`].
#[derive(Clone)]
pub struct RedirectWalker {
    fetcher: Arc<dyn PageFetcher>,
}

impl RedirectWalker {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Walks from `start_url` for at most `max_hops` iterations.
    ///
    /// Never fails: a request error ends the walk at the URL that failed.
    pub async fn walk(&self, start_url: &str, max_hops: usize) -> WalkOutcome {
        self.walk_after(start_url, max_hops, Vec::new()).await
    }

    /// Continues a resolution that already requested `history`.
    ///
    /// The URLs in `history` count as visited, so none of them is requested
    /// again, and they stay at the head of the returned `visited` chain.
    pub async fn walk_after(
        &self,
        start_url: &str,
        max_hops: usize,
        history: Vec<String>,
    ) -> WalkOutcome {
        // Compared in normalized form so `https://a.test` and `https://a.test/` are one URL.
        let mut current = parse_http_url(start_url)
            .map(|u| u.to_string())
            .unwrap_or_else(|| start_url.trim().to_string());
        let mut outcome = WalkOutcome {
            visited: history,
            ..Default::default()
        };

        for hop in 0..max_hops {
            match self.step(&current, hop, &mut outcome).await {
                Transition::Follow(next) => current = next,
                Transition::Stop => break,
            }
        }

        info!(
            "Walk from {} ended at {} after {} request(s)",
            start_url,
            current,
            outcome.visited.len()
        );
        outcome.final_url = current;
        outcome
    }

    async fn step(&self, current: &str, hop: usize, outcome: &mut WalkOutcome) -> Transition {
        // 1. Only absolute http(s) URLs can be walked.
        let Some(url) = parse_http_url(current) else {
            debug!("hop {}: {} is not an absolute http(s) URL", hop, current);
            return Transition::Stop;
        };
        let current = url.as_str();

        // 2. Cycle guard.
        if outcome.visited.iter().any(|v| v == current) {
            debug!("hop {}: {} already visited", hop, current);
            return Transition::Stop;
        }

        // 3. Nothing to fetch when the URL already carries coordinates.
        if extract_from_url(current).is_some() {
            debug!("hop {}: coordinates present in {}", hop, current);
            return Transition::Stop;
        }

        // 4. One request, redirects handled here.
        outcome.visited.push(current.to_string());
        let page = match self.fetcher.fetch(current).await {
            Ok(page) => page,
            Err(e) => {
                debug!("hop {}: request to {} failed: {}", hop, current, e);
                return Transition::Stop;
            }
        };
        debug!("hop {}: {} answered {}", hop, current, page.status);

        // 5. HTTP redirect.
        if let Some(next) = redirect_target(&url, &page) {
            return Transition::Follow(next);
        }

        // 6. Escape hatch embedded in an HTML page.
        if page.is_html() {
            let next = find_escape_hatch(&page.body, &url, &outcome.visited);
            outcome.last_html = Some(page.body);
            if let Some(next) = next {
                debug!("hop {}: page points to {}", hop, next);
                return Transition::Follow(next);
            }
        }

        // 7. The URL itself wraps its destination.
        if let Some(next) = unwrap_wrapper(&url).filter(|n| n != current) {
            return Transition::Follow(next);
        }

        // 8. Nowhere left to go.
        Transition::Stop
    }
}

/// Parses `raw` and accepts it only as an absolute http or https URL.
pub fn parse_http_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

pub fn is_http_url(raw: &str) -> bool {
    parse_http_url(raw).is_some()
}

fn redirect_target(base: &Url, page: &FetchedPage) -> Option<String> {
    if !page.is_redirect() {
        return None;
    }
    let location = page.location.as_deref()?.trim();
    resolve_candidate(base, location)
}

/// Resolves a possibly relative reference and keeps it only if it is http(s).
fn resolve_candidate(base: &Url, candidate: &str) -> Option<String> {
    let joined = base.join(candidate.trim()).ok()?;
    matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
}

/// Scans an HTML page for the first URL it points the browser to.
///
/// Priority: canonical link, meta refresh, `location =` assignment,
/// `location.replace(...)`, embedded maps link, wrapper `url=`/`q=` parameter.
/// Candidates equal to `base` or listed in `visited` are skipped, so a
/// self-referencing canonical link does not hide a later rule.
pub fn find_escape_hatch(html: &str, base: &Url, visited: &[String]) -> Option<String> {
    let text = unescape_markup(html);
    let fresh = |candidate: String| {
        (candidate != base.as_str() && !visited.iter().any(|v| *v == candidate)).then_some(candidate)
    };

    let captured = [
        &*CANONICAL_RE,
        &*CANONICAL_HREF_FIRST_RE,
        &*META_REFRESH_RE,
        &*JS_ASSIGN_RE,
        &*JS_REPLACE_RE,
    ];
    for re in captured {
        if let Some(next) = re
            .captures_iter(&text)
            .find_map(|caps| resolve_candidate(base, caps.get(1)?.as_str()).and_then(fresh))
        {
            return Some(next);
        }
    }

    MAPS_LINK_RE
        .find_iter(&text)
        .find_map(|m| parse_http_url(m.as_str()).and_then(|u| fresh(u.to_string())))
        .or_else(|| {
            WRAPPER_PARAM_RE.captures_iter(&text).find_map(|caps| {
                parse_http_url(&percent_decode(caps.get(1)?.as_str()))
                    .and_then(|u| fresh(u.to_string()))
            })
        })
}

/// Finds a Google Maps deep link or short link embedded in `html`.
pub fn find_maps_link(html: &str) -> Option<String> {
    let text = unescape_markup(html);
    MAPS_LINK_RE
        .find_iter(&text)
        .find_map(|m| parse_http_url(m.as_str()))
        .map(|u| u.to_string())
}

/// Unwraps `https://www.google.com/url?q=<target>` style wrappers.
fn unwrap_wrapper(url: &Url) -> Option<String> {
    url.query_pairs()
        .filter(|(k, _)| WRAPPER_PARAMS.iter().any(|p| **k == **p))
        .find_map(|(_, v)| parse_http_url(&v))
        .map(|u| u.to_string())
}

fn percent_decode(raw: &str) -> String {
    url::form_urlencoded::parse(format!("v={raw}").as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| raw.to_string())
}
