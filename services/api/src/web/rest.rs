//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{ErrorBody, HttpError};
use crate::web::state::AppState;
use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Redirect},
    Form,
};
use chrono::{DateTime, Utc};
use roadmap_core::{Coordinates, Point, ResolutionDebug, Submission};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};

/// Listing size when `max` is absent or unparsable.
pub const DEFAULT_MAX_RECORDS: usize = 2000;
/// Hard cap on `max`.
pub const MAX_RECORDS_CAP: usize = 5000;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_points_handler,
        meta_handler,
        submit_handler,
        list_notes_handler,
        add_note_handler,
        delete_note_handler,
    ),
    components(
        schemas(
            PointsResponse,
            PointDto,
            MetaResponse,
            SubmitRequest,
            SubmitResponse,
            CoordinatesDto,
            AddNoteRequest,
            NotesResponse,
            ErrorBody
        )
    ),
    tags(
        (name = "Road Map API", description = "Points of interest, link resolution and per-point notes.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize)]
pub struct ListQuery {
    max: Option<String>,
}

impl ListQuery {
    /// `max` is clamped to [1, 5000]; anything unparsable means the default.
    pub fn max_records(&self) -> usize {
        self.max
            .as_deref()
            .and_then(|m| m.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_RECORDS)
            .clamp(1, MAX_RECORDS_CAP)
    }
}

#[derive(Serialize, ToSchema)]
pub struct CoordinatesDto {
    pub lat: f64,
    pub lng: f64,
}

impl From<Coordinates> for CoordinatesDto {
    fn from(c: Coordinates) -> Self {
        Self {
            lat: c.lat(),
            lng: c.lng(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PointDto {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub category: String,
    pub subcategory: String,
    pub note: String,
    #[serde(rename = "createdTime", skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
}

impl From<Point> for PointDto {
    fn from(p: Point) -> Self {
        Self {
            id: p.id,
            name: p.name,
            lat: p.coordinates.lat(),
            lng: p.coordinates.lng(),
            category: p.category,
            subcategory: p.subcategory,
            note: p.note,
            created_time: p.created_time,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PointsResponse {
    pub ok: bool,
    pub count: usize,
    pub points: Vec<PointDto>,
    pub categories: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MetaResponse {
    pub ok: bool,
    pub categories: Vec<String>,
    pub subcategories: BTreeMap<String, Vec<String>>,
}

/// The submission payload, shared by the JSON endpoint and the plain form fallback.
#[derive(Deserialize, ToSchema, Default)]
pub struct SubmitRequest {
    #[serde(default)]
    pub name: String,
    /// A Google Maps link or a free-text address.
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub note: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub lng: Option<f64>,
}

impl From<SubmitRequest> for Submission {
    fn from(req: SubmitRequest) -> Self {
        Submission {
            name: req.name,
            link: req.link,
            category: req.category,
            subcategory: req.subcategory,
            note: req.note,
            lat: req.lat,
            lng: req.lng,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Accepts `12.5`, `"12.5"`, `""` or nothing; anything unparsable is `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(s)) => s.trim().parse::<f64>().ok(),
        None => None,
    })
}

#[derive(Serialize, ToSchema)]
pub struct SubmitResponse {
    pub ok: bool,
    pub id: String,
    pub coordinates: CoordinatesDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub debug: Option<ResolutionDebug>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddNoteRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize, ToSchema)]
pub struct NotesResponse {
    pub ok: bool,
    /// Newest first.
    pub notes: Vec<String>,
}

impl NotesResponse {
    fn new(notes: Vec<String>) -> Json<Self> {
        Json(Self { ok: true, notes })
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List stored points.
///
/// Records with a missing name or category, or without valid coordinates,
/// are left out instead of failing the listing.
#[utoipa::path(
    get,
    path = "/api/points",
    params(("max" = Option<usize>, Query, description = "Maximum number of records (default 2000, at most 5000).")),
    responses(
        (status = 200, description = "The points", body = PointsResponse),
        (status = 500, description = "The point store failed", body = ErrorBody)
    )
)]
pub async fn list_points_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PointsResponse>, HttpError> {
    let points = app_state
        .store
        .list_points(query.max_records())
        .await
        .map_err(|e| {
            error!("Failed to list points: {:?}", e);
            HttpError::from(e)
        })?;

    let points: Vec<PointDto> = points.into_iter().map(PointDto::from).collect();
    Ok(Json(PointsResponse {
        ok: true,
        count: points.len(),
        points,
        categories: app_state.registry.categories(),
    }))
}

/// Categories with their known subcategories, including those seen on stored points.
#[utoipa::path(
    get,
    path = "/api/meta",
    params(("max" = Option<usize>, Query, description = "How many records to scan for subcategories.")),
    responses(
        (status = 200, description = "The registry", body = MetaResponse),
        (status = 500, description = "The point store failed", body = ErrorBody)
    )
)]
pub async fn meta_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<MetaResponse>, HttpError> {
    let points = app_state
        .store
        .list_points(query.max_records())
        .await
        .map_err(|e| {
            error!("Failed to read points for meta: {:?}", e);
            HttpError::from(e)
        })?;

    let mut registry = app_state.registry.clone();
    registry.merge_observed(&points);
    Ok(Json(MetaResponse {
        ok: true,
        categories: registry.categories(),
        subcategories: registry.subcategory_map(),
    }))
}

/// Submit a new point from a Google Maps link or an address.
#[utoipa::path(
    post,
    path = "/api/submit",
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Point created", body = SubmitResponse),
        (status = 400, description = "Invalid input or no coordinates found", body = ErrorBody),
        (status = 500, description = "The point store failed", body = ErrorBody)
    )
)]
pub async fn submit_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, HttpError> {
    let Json(req) = payload?;
    let created = app_state
        .submissions
        .submit(&app_state.registry, req.into())
        .await
        .map_err(|e| {
            if e.is_client_error() {
                info!("Submission rejected: {}", e);
            } else {
                error!("Submission failed: {:?}", e);
            }
            HttpError::from(e)
        })?;

    Ok(Json(SubmitResponse {
        ok: true,
        id: created.id,
        coordinates: created.coordinates.into(),
        debug: created.debug,
    }))
}

/// Plain HTML form fallback: redirects back to the form with the outcome.
pub async fn submit_form_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Form<SubmitRequest>, FormRejection>,
) -> Redirect {
    let req = match payload {
        Ok(Form(req)) => req,
        Err(rejection) => {
            info!("Unreadable form submission: {}", rejection.body_text());
            return form_error(&rejection.body_text());
        }
    };
    match app_state
        .submissions
        .submit(&app_state.registry, req.into())
        .await
    {
        Ok(_) => Redirect::to("/form?ok=1"),
        Err(e) => {
            info!("Form submission rejected: {}", e);
            form_error(&e.to_string())
        }
    }
}

fn form_error(message: &str) -> Redirect {
    let message: String = url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
    Redirect::to(&format!("/form?err={}", message))
}

/// List the notes of a point, newest first.
#[utoipa::path(
    get,
    path = "/api/points/{id}/notes",
    params(("id" = String, Path, description = "The point id.")),
    responses(
        (status = 200, description = "The notes", body = NotesResponse),
        (status = 404, description = "Unknown point", body = ErrorBody)
    )
)]
pub async fn list_notes_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<NotesResponse>, HttpError> {
    let notes = app_state.notes.list(&id).await?;
    Ok(NotesResponse::new(notes))
}

/// Prepend a note to a point's log.
#[utoipa::path(
    post,
    path = "/api/points/{id}/notes",
    params(("id" = String, Path, description = "The point id.")),
    request_body = AddNoteRequest,
    responses(
        (status = 200, description = "The updated notes", body = NotesResponse),
        (status = 400, description = "Empty note", body = ErrorBody),
        (status = 404, description = "Unknown point", body = ErrorBody)
    )
)]
pub async fn add_note_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<AddNoteRequest>, JsonRejection>,
) -> Result<Json<NotesResponse>, HttpError> {
    let Json(req) = payload?;
    let notes = app_state.notes.add(&id, &req.text).await?;
    Ok(NotesResponse::new(notes))
}

/// Delete the note at `index` (0 is the newest).
#[utoipa::path(
    delete,
    path = "/api/points/{id}/notes/{index}",
    params(
        ("id" = String, Path, description = "The point id."),
        ("index" = usize, Path, description = "Position in the log, newest first.")
    ),
    responses(
        (status = 200, description = "The updated notes", body = NotesResponse),
        (status = 400, description = "Index out of range", body = ErrorBody),
        (status = 404, description = "Unknown point", body = ErrorBody)
    )
)]
pub async fn delete_note_handler(
    State(app_state): State<Arc<AppState>>,
    Path((id, index)): Path<(String, String)>,
) -> Result<Json<NotesResponse>, HttpError> {
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|_| HttpError::new(StatusCode::BAD_REQUEST, format!("Invalid note index: {}", index)))?;
    let notes = app_state.notes.delete(&id, index).await?;
    Ok(NotesResponse::new(notes))
}

pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}
