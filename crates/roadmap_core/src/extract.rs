//! crates/roadmap_core/src/extract.rs
//!
//! The Coordinate Extractor. Pure, total functions that pattern-match known
//! coordinate encodings out of a URL or an HTML document.
//!
//! Every encoding is an independent [`Strategy`]; the public functions try
//! a fixed, ordered list of them and the first one producing valid
//! [`Coordinates`] wins. New site-specific encodings are added by appending a
//! strategy, the callers never change.

use regex::Regex;
use std::sync::LazyLock;

use crate::domain::Coordinates;

/// Signed decimal, optional fractional part.
const NUM: &str = r"-?\d+(?:\.\d+)?";

/// One named coordinate encoding. The pattern captures `lat` then `lng`.
pub struct Strategy {
    pub name: &'static str,
    pattern: Regex,
}

impl Strategy {
    fn new(name: &'static str, template: &str) -> Self {
        let pattern = Regex::new(&template.replace("{NUM}", NUM))
            .expect("coordinate patterns are static and valid");
        Self { name, pattern }
    }

    /// Returns the first match whose captures parse as in-range coordinates.
    pub fn extract(&self, text: &str) -> Option<Coordinates> {
        self.pattern
            .captures_iter(text)
            .find_map(|caps| Coordinates::parse(caps.get(1)?.as_str(), caps.get(2)?.as_str()))
    }
}

/// URL encodings, highest priority first.
pub static URL_STRATEGIES: LazyLock<Vec<Strategy>> = LazyLock::new(|| {
    vec![
        Strategy::new("viewport", r"@({NUM}),({NUM})"),
        Strategy::new("query", r"[?&]q=({NUM}),({NUM})"),
        Strategy::new("search_path", r"/maps/search/({NUM}),(?:\s|\+|%20)*({NUM})"),
        Strategy::new("place_data", r"!3d({NUM})!4d({NUM})"),
        Strategy::new("ll_param", r"[?&]ll=({NUM})(?:,|%2[cC])({NUM})"),
        Strategy::new(
            "named_param",
            r"[?&](?:destination|query|center)=({NUM})(?:,|%2[cC])({NUM})",
        ),
    ]
});

/// Markup-only encodings, tried after the URL encodings have been run over the page.
pub static HTML_STRATEGIES: LazyLock<Vec<Strategy>> = LazyLock::new(|| {
    vec![
        Strategy::new(
            "static_map_center",
            r#"(?i)staticmap[^"'<>\s]*?center=({NUM})(?:,|%2C)({NUM})"#,
        ),
        Strategy::new("bare_center", r"center=({NUM})(?:,|%2[cC])({NUM})"),
        Strategy::new("bare_ll", r"ll=({NUM})(?:,|%2[cC])({NUM})"),
    ]
});

/// Runs `strategies` in order and reports which one matched.
pub fn extract_with(strategies: &[Strategy], text: &str) -> Option<(&'static str, Coordinates)> {
    strategies
        .iter()
        .find_map(|s| s.extract(text).map(|c| (s.name, c)))
}

pub fn extract_from_url(url: &str) -> Option<Coordinates> {
    extract_with(&URL_STRATEGIES, url.trim()).map(|(_, c)| c)
}

/// Treats the document as opaque text: URL encodings first, then markup-only ones.
pub fn extract_from_html(html: &str) -> Option<Coordinates> {
    let text = unescape_markup(html);
    extract_with(&URL_STRATEGIES, &text)
        .or_else(|| extract_with(&HTML_STRATEGIES, &text))
        .map(|(_, c)| c)
}

/// Undoes the escaping that commonly wraps URLs embedded in markup and inline scripts.
pub fn unescape_markup(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("\\u0026", "&")
        .replace("\\u003d", "=")
        .replace("\\/", "/")
}
