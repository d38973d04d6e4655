//! crates/roadmap_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any datastore or transport format.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A validated latitude/longitude pair.
///
/// Both components are finite, `lat` lies in [-90, 90] and `lng` in [-180, 180].
/// The only way to build one is [`Coordinates::new`], so every value in the
/// system already satisfies the invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    lat: f64,
    lng: f64,
}

impl Coordinates {
    /// Returns `None` when either component is non-finite or out of range.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        Some(Self { lat, lng })
    }

    /// Parses two decimal strings, as captured from a URL or a datastore field.
    pub fn parse(lat: &str, lng: &str) -> Option<Self> {
        let lat = lat.trim().parse::<f64>().ok()?;
        let lng = lng.trim().parse::<f64>().ok()?;
        Self::new(lat, lng)
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

/// A point of interest as read back from the point store.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub id: String,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub note: String,
    pub coordinates: Coordinates,
    pub created_time: Option<DateTime<Utc>>,
}

/// The payload used to create a new point. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPoint {
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub note: String,
    pub coordinates: Coordinates,
}

/// What the Redirect Walker reached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkOutcome {
    pub final_url: String,
    /// Every URL the walker stepped onto, in order.
    pub visited: Vec<String>,
    /// The most recent HTML body seen during the walk.
    pub last_html: Option<String>,
}

/// The result of one link resolution attempt.
///
/// A `None` in `coordinates` is an expected outcome, not a fault.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionResult {
    pub coordinates: Option<Coordinates>,
    pub final_url: String,
    pub visited_urls: Vec<String>,
    pub source_html: Option<String>,
}

/// A submission exactly as the form sends it, before validation.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub name: String,
    pub link: String,
    pub category: String,
    pub subcategory: String,
    pub note: String,
    /// Explicit coordinates bypass link resolution when both are finite.
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Diagnostics attached to a resolution, for operator troubleshooting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionDebug {
    pub final_url: String,
    pub visited: Vec<String>,
}

impl From<&ResolutionResult> for ResolutionDebug {
    fn from(result: &ResolutionResult) -> Self {
        Self {
            final_url: result.final_url.clone(),
            visited: result.visited_urls.clone(),
        }
    }
}

/// A successfully persisted submission.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPoint {
    pub id: String,
    pub coordinates: Coordinates,
    pub debug: Option<ResolutionDebug>,
}
