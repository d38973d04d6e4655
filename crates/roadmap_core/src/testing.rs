//! In-memory port implementations shared by the unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::{Coordinates, NewPoint, Point};
use crate::ports::{FetchedPage, Geocoder, PageFetcher, PointStore, PortError, PortResult};

/// Serves one canned response per URL and records every request.
#[derive(Default)]
pub struct CannedFetcher {
    pages: HashMap<String, FetchedPage>,
    calls: Mutex<Vec<String>>,
}

impl CannedFetcher {
    pub fn redirect(mut self, from: &str, location: &str) -> Self {
        self.pages.insert(
            from.to_string(),
            FetchedPage {
                status: 302,
                location: Some(location.to_string()),
                ..Default::default()
            },
        );
        self
    }

    pub fn html(self, url: &str, body: &str) -> Self {
        self.page(url, "text/html; charset=utf-8", body)
    }

    pub fn text(self, url: &str, body: &str) -> Self {
        self.page(url, "text/plain", body)
    }

    fn page(mut self, url: &str, content_type: &str, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchedPage {
                status: 200,
                location: None,
                content_type: Some(content_type.to_string()),
                body: body.to_string(),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for CannedFetcher {
    async fn fetch(&self, url: &str) -> PortResult<FetchedPage> {
        self.calls.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| PortError::Unexpected(format!("connection refused: {url}")))
    }
}

/// Answers from a fixed address book and counts lookups.
#[derive(Default)]
pub struct StubGeocoder {
    known: HashMap<String, Coordinates>,
    lookups: Mutex<usize>,
}

impl StubGeocoder {
    pub fn knowing(mut self, address: &str, lat: f64, lng: f64) -> Self {
        self.known
            .insert(address.to_string(), Coordinates::new(lat, lng).unwrap());
        self
    }

    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, address: &str) -> Option<Coordinates> {
        *self.lookups.lock().unwrap() += 1;
        self.known.get(address).copied()
    }
}

/// A vector-backed point store with string notes blobs.
#[derive(Default)]
pub struct MemoryStore {
    points: Mutex<Vec<(Point, String)>>,
    fail_writes: bool,
}

impl MemoryStore {
    /// A store whose `create_point` always fails.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn with_point(self, id: &str, notes_blob: &str) -> Self {
        let point = Point {
            id: id.to_string(),
            name: format!("point {id}"),
            category: "Parking".to_string(),
            subcategory: String::new(),
            note: String::new(),
            coordinates: Coordinates::new(1.0, 2.0).unwrap(),
            created_time: None,
        };
        self.points
            .lock()
            .unwrap()
            .push((point, notes_blob.to_string()));
        self
    }

    pub fn blob(&self, id: &str) -> Option<String> {
        self.points
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p.id == id)
            .map(|(_, b)| b.clone())
    }

    pub fn len(&self) -> usize {
        self.points.lock().unwrap().len()
    }
}

#[async_trait]
impl PointStore for MemoryStore {
    async fn list_points(&self, max: usize) -> PortResult<Vec<Point>> {
        let points = self.points.lock().unwrap();
        Ok(points.iter().take(max).map(|(p, _)| p.clone()).collect())
    }

    async fn create_point(&self, point: &NewPoint) -> PortResult<String> {
        if self.fail_writes {
            return Err(PortError::Unexpected("store unavailable".to_string()));
        }
        let mut points = self.points.lock().unwrap();
        let id = format!("rec{}", points.len() + 1);
        points.push((
            Point {
                id: id.clone(),
                name: point.name.clone(),
                category: point.category.clone(),
                subcategory: point.subcategory.clone(),
                note: point.note.clone(),
                coordinates: point.coordinates,
                created_time: None,
            },
            String::new(),
        ));
        Ok(id)
    }

    async fn read_notes(&self, point_id: &str) -> PortResult<String> {
        self.blob(point_id)
            .ok_or_else(|| PortError::NotFound(format!("Point {point_id} not found")))
    }

    async fn write_notes(&self, point_id: &str, blob: &str) -> PortResult<()> {
        let mut points = self.points.lock().unwrap();
        let entry = points
            .iter_mut()
            .find(|(p, _)| p.id == point_id)
            .ok_or_else(|| PortError::NotFound(format!("Point {point_id} not found")))?;
        entry.1 = blob.to_string();
        Ok(())
    }
}
