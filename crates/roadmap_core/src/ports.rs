//! crates/roadmap_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of Airtable, the geocoding provider and the HTTP client.

use async_trait::async_trait;

use crate::domain::{Coordinates, NewPoint, Point};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., datastore, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The tabular record store holding points and their notes.
#[async_trait]
pub trait PointStore: Send + Sync {
    /// Lists up to `max` points. Records that cannot be turned into a valid
    /// [`Point`] are skipped rather than failing the whole listing.
    async fn list_points(&self, max: usize) -> PortResult<Vec<Point>>;

    /// Persists a new point and returns the store-assigned id.
    async fn create_point(&self, point: &NewPoint) -> PortResult<String>;

    /// Reads the raw, encoded notes blob of a point. An absent field is an empty blob.
    async fn read_notes(&self, point_id: &str) -> PortResult<String>;

    /// Overwrites the full notes blob of a point.
    async fn write_notes(&self, point_id: &str, blob: &str) -> PortResult<()>;
}

/// Free-text address lookup.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Returns the best match for `address`. Every failure mode yields `None`.
    async fn geocode(&self, address: &str) -> Option<Coordinates>;
}

/// A single HTTP response, observed without following redirects.
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    pub status: u16,
    /// The raw `Location` header, if any.
    pub location: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

impl FetchedPage {
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("text/html"))
            .unwrap_or(false)
    }
}

/// Issues one GET per call and never follows redirects on its own.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> PortResult<FetchedPage>;
}
