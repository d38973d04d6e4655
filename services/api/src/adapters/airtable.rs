//! services/api/src/adapters/airtable.rs
//!
//! This module contains the Airtable adapter, which is the concrete implementation
//! of the `PointStore` port from the `core` crate. It talks to the Airtable REST
//! API with `reqwest`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, StatusCode};
use roadmap_core::domain::{Coordinates, NewPoint, Point};
use roadmap_core::ports::{PointStore, PortError, PortResult};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use url::Url;

// Field names exactly as they appear in the table ("Lattitude" included).
pub const FIELD_NAME: &str = "Name";
pub const FIELD_LAT: &str = "Lattitude";
pub const FIELD_LNG: &str = "Longitude";
pub const FIELD_CAT: &str = "Category";
pub const FIELD_SUB: &str = "Subcategory";
pub const FIELD_NOTE: &str = "Note";
pub const FIELD_NOTES: &str = "Notes";

/// Airtable never returns more than this many records per page.
const PAGE_SIZE: usize = 100;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `PointStore` port on top of one Airtable table.
#[derive(Clone)]
pub struct AirtableAdapter {
    client: Client,
    api_url: String,
    token: String,
    base_id: String,
    table_id: String,
}

impl AirtableAdapter {
    /// Creates a new `AirtableAdapter`.
    pub fn new(
        client: Client,
        api_url: impl Into<String>,
        token: impl Into<String>,
        base_id: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            token: token.into(),
            base_id: base_id.into(),
            table_id: table_id.into(),
        }
    }

    fn table_url(&self) -> PortResult<Url> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| PortError::Unexpected(format!("Invalid Airtable URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| PortError::Unexpected("Airtable URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(&self.base_id)
            .push(&self.table_id);
        Ok(url)
    }

    fn record_url(&self, record_id: &str) -> PortResult<Url> {
        let mut url = self.table_url()?;
        url.path_segments_mut()
            .map_err(|_| PortError::Unexpected("Airtable URL cannot be a base".to_string()))?
            .push(record_id);
        Ok(url)
    }

    /// Sends one request and returns the parsed JSON body.
    ///
    /// Non-2xx answers become a `PortError` carrying Airtable's own message.
    async fn request(&self, method: Method, url: Url, body: Option<Value>) -> PortResult<Value> {
        debug!("Airtable {} {}", method, url);
        let mut builder = self
            .client
            .request(method, url)
            .bearer_auth(&self.token);
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let json: Option<Value> = if text.is_empty() {
            None
        } else {
            serde_json::from_str(&text).ok()
        };

        if !status.is_success() {
            let message = error_message(json.as_ref())
                .or_else(|| (!text.is_empty()).then(|| text.clone()))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            warn!("Airtable answered {}: {}", status, message);
            return Err(match status {
                StatusCode::NOT_FOUND => PortError::NotFound(message),
                _ => PortError::Unexpected(message),
            });
        }

        json.ok_or_else(|| PortError::Unexpected("Airtable returned an empty body".to_string()))
    }
}

/// Airtable reports errors as `{"error": {"message": ...}}` or `{"error": "CODE"}`.
fn error_message(json: Option<&Value>) -> Option<String> {
    let error = json?.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
}

//=========================================================================================
// "Impure" Airtable Record Structs
//=========================================================================================

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<AirtableRecord>,
    offset: Option<String>,
}

#[derive(Deserialize)]
struct AirtableRecord {
    id: String,
    #[serde(default)]
    fields: Map<String, Value>,
    #[serde(rename = "createdTime")]
    created_time: Option<DateTime<Utc>>,
}

impl AirtableRecord {
    /// Returns `None` for records without a name, a category or usable coordinates.
    fn to_domain(self) -> Option<Point> {
        let name = text_field(&self.fields, FIELD_NAME);
        let category = text_field(&self.fields, FIELD_CAT);
        if name.is_empty() || category.is_empty() {
            return None;
        }
        let coordinates = Coordinates::new(
            number_field(&self.fields, FIELD_LAT)?,
            number_field(&self.fields, FIELD_LNG)?,
        )?;
        Some(Point {
            id: self.id,
            name,
            category,
            subcategory: text_field(&self.fields, FIELD_SUB),
            note: text_field(&self.fields, FIELD_NOTE),
            coordinates,
            created_time: self.created_time,
        })
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Coordinates are written as strings but may come back as numbers.
fn number_field(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    match fields.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

//=========================================================================================
// `PointStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl PointStore for AirtableAdapter {
    async fn list_points(&self, max: usize) -> PortResult<Vec<Point>> {
        let mut points = Vec::new();
        let mut fetched = 0usize;
        let mut offset: Option<String> = None;

        loop {
            let mut url = self.table_url()?;
            {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("maxRecords", &max.to_string())
                    .append_pair("pageSize", &PAGE_SIZE.min(max.max(1)).to_string());
                if let Some(offset) = &offset {
                    query.append_pair("offset", offset);
                }
            }

            let page: ListResponse = serde_json::from_value(self.request(Method::GET, url, None).await?)
                .map_err(|e| PortError::Unexpected(format!("Malformed Airtable listing: {}", e)))?;
            fetched += page.records.len();
            points.extend(page.records.into_iter().filter_map(AirtableRecord::to_domain));

            offset = page.offset;
            if offset.is_none() || fetched >= max {
                break;
            }
        }

        debug!("Listed {} valid points out of {} records", points.len(), fetched);
        Ok(points)
    }

    async fn create_point(&self, point: &NewPoint) -> PortResult<String> {
        let payload = json!({
            "records": [{
                "fields": {
                    FIELD_NAME: point.name,
                    FIELD_CAT: point.category,
                    FIELD_SUB: point.subcategory,
                    FIELD_NOTE: point.note,
                    FIELD_LAT: point.coordinates.lat().to_string(),
                    FIELD_LNG: point.coordinates.lng().to_string(),
                }
            }]
        });

        let created = self
            .request(Method::POST, self.table_url()?, Some(payload))
            .await?;
        created
            .get("records")
            .and_then(|records| records.get(0))
            .and_then(|record| record.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| PortError::Unexpected("Airtable did not return the created record id".to_string()))
    }

    async fn read_notes(&self, point_id: &str) -> PortResult<String> {
        let record = self
            .request(Method::GET, self.record_url(point_id)?, None)
            .await?;
        Ok(record
            .get("fields")
            .and_then(|fields| fields.get(FIELD_NOTES))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn write_notes(&self, point_id: &str, blob: &str) -> PortResult<()> {
        let payload = json!({ "fields": { FIELD_NOTES: blob } });
        self.request(Method::PATCH, self.record_url(point_id)?, Some(payload))
            .await?;
        Ok(())
    }
}
