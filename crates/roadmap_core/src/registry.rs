//! crates/roadmap_core/src/registry.rs
//!
//! The category/subcategory registry.
//!
//! Categories form a fixed list chosen at startup. Subcategories are open:
//! every category starts with its default subcategories and gains the ones
//! observed on stored points. The registry is a plain value handed to the
//! submission and listing paths; nothing here is global.

use std::collections::BTreeMap;

use crate::domain::Point;

pub const DEFAULT_CATEGORIES: [&str; 5] = [
    "Stacja benzynowa",
    "Warsztat",
    "Parking",
    "Ważne Miejsce",
    "Agencja celna / weterynarz",
];

const DEFAULT_SUBCATEGORIES: [(&str, &[&str]); 1] =
    [("Stacja benzynowa", &["Zwykła", "Preferowana"])];

#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    entries: Vec<(String, Vec<String>)>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES)
    }
}

impl Registry {
    /// Builds a registry from category names, seeding the default subcategories.
    /// Names are trimmed; blanks and duplicates are dropped.
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self {
            entries: Vec::new(),
        };
        for category in categories {
            let category = category.as_ref().trim();
            if category.is_empty() || registry.contains(category) {
                continue;
            }
            registry.entries.push((category.to_string(), Vec::new()));
        }
        for (category, subs) in DEFAULT_SUBCATEGORIES {
            for sub in subs {
                registry.add_subcategory(category, sub);
            }
        }
        registry
    }

    pub fn contains(&self, category: &str) -> bool {
        let category = category.trim();
        self.entries.iter().any(|(c, _)| c == category)
    }

    pub fn categories(&self) -> Vec<String> {
        self.entries.iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn subcategories(&self, category: &str) -> &[String] {
        let category = category.trim();
        self.entries
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, subs)| subs.as_slice())
            .unwrap_or(&[])
    }

    /// Records `sub` under `category`. Returns whether the registry changed.
    ///
    /// Unknown categories and blank names are ignored; names are compared
    /// case-sensitively after trimming.
    pub fn add_subcategory(&mut self, category: &str, sub: &str) -> bool {
        let (category, sub) = (category.trim(), sub.trim());
        if sub.is_empty() {
            return false;
        }
        match self.entries.iter_mut().find(|(c, _)| c == category) {
            Some((_, subs)) if !subs.iter().any(|s| s == sub) => {
                subs.push(sub.to_string());
                true
            }
            _ => false,
        }
    }

    /// Merges the subcategories seen on stored points.
    pub fn merge_observed(&mut self, points: &[Point]) {
        for point in points {
            self.add_subcategory(&point.category, &point.subcategory);
        }
    }

    pub fn subcategory_map(&self) -> BTreeMap<String, Vec<String>> {
        self.entries.iter().cloned().collect()
    }
}
