//! In-memory port implementations shared by the router tests.

#![allow(dead_code)]

use api_lib::web::{api_routes, state::AppState};
use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use roadmap_core::{
    Coordinates, FetchedPage, Geocoder, NewPoint, PageFetcher, Point, PointStore, PortError,
    PortResult, Registry,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct FakeStore {
    pub points: Mutex<Vec<Point>>,
    pub created: Mutex<Vec<NewPoint>>,
    pub notes: Mutex<HashMap<String, String>>,
}

impl FakeStore {
    pub fn with_point(self, id: &str, category: &str, subcategory: &str) -> Self {
        self.points.lock().unwrap().push(Point {
            id: id.to_string(),
            name: format!("Point {}", id),
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            note: String::new(),
            coordinates: Coordinates::new(52.0, 21.0).unwrap(),
            created_time: None,
        });
        self.notes.lock().unwrap().insert(id.to_string(), String::new());
        self
    }

    pub fn notes_blob(&self, id: &str) -> Option<String> {
        self.notes.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl PointStore for FakeStore {
    async fn list_points(&self, max: usize) -> PortResult<Vec<Point>> {
        Ok(self.points.lock().unwrap().iter().take(max).cloned().collect())
    }

    async fn create_point(&self, point: &NewPoint) -> PortResult<String> {
        let mut created = self.created.lock().unwrap();
        created.push(point.clone());
        Ok(format!("recNew{}", created.len()))
    }

    async fn read_notes(&self, point_id: &str) -> PortResult<String> {
        self.notes
            .lock()
            .unwrap()
            .get(point_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("No point {}", point_id)))
    }

    async fn write_notes(&self, point_id: &str, blob: &str) -> PortResult<()> {
        let mut notes = self.notes.lock().unwrap();
        match notes.get_mut(point_id) {
            Some(existing) => {
                *existing = blob.to_string();
                Ok(())
            }
            None => Err(PortError::NotFound(format!("No point {}", point_id))),
        }
    }
}

/// Answers from a fixed table of pages; anything else is a network error.
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, FetchedPage>,
}

impl FakeFetcher {
    pub fn redirect(mut self, from: &str, to: &str) -> Self {
        self.pages.insert(
            from.to_string(),
            FetchedPage {
                status: 302,
                location: Some(to.to_string()),
                ..Default::default()
            },
        );
        self
    }

    pub fn html(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchedPage {
                status: 200,
                content_type: Some("text/html; charset=utf-8".to_string()),
                body: body.to_string(),
                ..Default::default()
            },
        );
        self
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> PortResult<FetchedPage> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| PortError::Unexpected(format!("unreachable: {}", url)))
    }
}

#[derive(Default)]
pub struct FakeGeocoder {
    known: HashMap<String, (f64, f64)>,
}

impl FakeGeocoder {
    pub fn knowing(mut self, address: &str, lat: f64, lng: f64) -> Self {
        self.known.insert(address.to_string(), (lat, lng));
        self
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, address: &str) -> Option<Coordinates> {
        let (lat, lng) = *self.known.get(address)?;
        Coordinates::new(lat, lng)
    }
}

pub fn router(store: Arc<FakeStore>, fetcher: FakeFetcher, geocoder: FakeGeocoder) -> Router {
    let state = AppState::new(
        store,
        Arc::new(fetcher),
        Arc::new(geocoder),
        Registry::default(),
        10,
    );
    api_routes(Arc::new(state))
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
