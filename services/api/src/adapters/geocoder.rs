//! services/api/src/adapters/geocoder.rs
//!
//! This module contains the adapter for free-text address lookup.
//! It implements the `Geocoder` port from the `core` crate against a
//! Nominatim-compatible search endpoint.

use async_trait::async_trait;
use reqwest::Client;
use roadmap_core::{domain::Coordinates, ports::Geocoder};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `Geocoder` using the Nominatim search API.
#[derive(Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Creates a new `NominatimGeocoder`.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

/// One search hit. Nominatim sends coordinates as strings.
#[derive(Deserialize)]
struct Place {
    lat: Value,
    lon: Value,
}

fn component(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

//=========================================================================================
// `Geocoder` Trait Implementation
//=========================================================================================

#[async_trait]
impl Geocoder for NominatimGeocoder {
    /// Looks `address` up and keeps only the best match.
    async fn geocode(&self, address: &str) -> Option<Coordinates> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[("format", "json"), ("limit", "1"), ("q", address)])
            .send()
            .await
            .map_err(|e| warn!("Geocoder request failed: {}", e))
            .ok()?;

        if !response.status().is_success() {
            warn!("Geocoder answered {}", response.status());
            return None;
        }

        let places: Vec<Place> = response
            .json()
            .await
            .map_err(|e| warn!("Malformed geocoder payload: {}", e))
            .ok()?;
        let best = places.into_iter().next()?;
        let found = Coordinates::new(component(&best.lat)?, component(&best.lon)?);
        debug!("Geocoded '{}' to {:?}", address, found);
        found
    }
}
