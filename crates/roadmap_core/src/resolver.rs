//! crates/roadmap_core/src/resolver.rs
//!
//! The Link Resolver: turns a pasted link into coordinates by combining the
//! Redirect Walker with the Coordinate Extractor.

use std::sync::Arc;
use tracing::debug;

use crate::domain::{Coordinates, ResolutionResult, WalkOutcome};
use crate::extract::{extract_from_html, extract_from_url};
use crate::ports::PageFetcher;
use crate::walker::{find_maps_link, RedirectWalker, DEFAULT_MAX_HOPS};

#[derive(Clone)]
pub struct LinkResolver {
    walker: RedirectWalker,
    max_hops: usize,
}

impl LinkResolver {
    pub fn new(fetcher: Arc<dyn PageFetcher>, max_hops: usize) -> Self {
        Self {
            walker: RedirectWalker::new(fetcher),
            max_hops,
        }
    }

    pub fn with_default_hops(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::new(fetcher, DEFAULT_MAX_HOPS)
    }

    /// Resolves `input` to coordinates, best effort.
    ///
    /// Strategies, in order: the walk's final URL, a maps link embedded in the
    /// captured HTML (walked again with the remaining hop budget), the captured
    /// HTML itself, and finally the raw input. The hop budget is shared by both
    /// walks.
    pub async fn resolve(&self, input: &str) -> ResolutionResult {
        let input = input.trim();
        let first = self.walker.walk(input, self.max_hops).await;

        if let Some(c) = extract_from_url(&first.final_url) {
            return found(c, first);
        }

        let Some(html) = first.last_html.clone() else {
            return fallback_to_input(input, first);
        };

        if let Some(embedded) = find_maps_link(&html) {
            debug!("Final page embeds maps link {}", embedded);
            if let Some(c) = extract_from_url(&embedded) {
                let mut result = found(c, first);
                result.final_url = embedded;
                return result;
            }

            let budget = self.max_hops.saturating_sub(first.visited.len());
            let mut second = self
                .walker
                .walk_after(&embedded, budget, first.visited.clone())
                .await;
            if second.last_html.is_none() {
                second.last_html = Some(html.clone());
            }

            if let Some(c) = extract_from_url(&second.final_url) {
                return found(c, second);
            }
            if let Some(c) = second.last_html.as_deref().and_then(extract_from_html) {
                return found(c, second);
            }
            if let Some(c) = extract_from_html(&html) {
                return found(c, second);
            }
            return fallback_to_input(input, second);
        }

        match extract_from_html(&html) {
            Some(c) => found(c, first),
            None => fallback_to_input(input, first),
        }
    }
}

fn found(coordinates: Coordinates, walk: WalkOutcome) -> ResolutionResult {
    ResolutionResult {
        coordinates: Some(coordinates),
        final_url: walk.final_url,
        visited_urls: walk.visited,
        source_html: walk.last_html,
    }
}

fn fallback_to_input(input: &str, walk: WalkOutcome) -> ResolutionResult {
    ResolutionResult {
        coordinates: extract_from_url(input),
        final_url: walk.final_url,
        visited_urls: walk.visited,
        source_html: walk.last_html,
    }
}
