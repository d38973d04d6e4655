//! crates/roadmap_core/src/submission.rs
//!
//! Validates a form submission, derives its coordinates and persists it.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{Coordinates, CreatedPoint, NewPoint, ResolutionDebug, Submission};
use crate::ports::{Geocoder, PointStore, PortError};
use crate::registry::Registry;
use crate::resolver::LinkResolver;
use crate::walker::is_http_url;

/// Shown when neither the link nor the address produced coordinates.
pub const RESOLUTION_HINT: &str = "Could not extract coordinates from the link. \
    Try Google Maps → Share → Copy link (share the pin, not the whole page), \
    or type a fuller address.";

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Missing name")]
    MissingName,
    #[error("Missing category")]
    MissingCategory,
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    #[error("Missing google maps link or address")]
    MissingLink,
    #[error("{message}")]
    Unresolvable {
        message: String,
        debug: Option<ResolutionDebug>,
    },
    #[error("Point store error: {0}")]
    Upstream(#[from] PortError),
}

impl SubmissionError {
    /// Whether the submitter can fix this by changing the input.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, SubmissionError::Upstream(_))
    }
}

#[derive(Clone)]
pub struct SubmissionService {
    resolver: LinkResolver,
    geocoder: Arc<dyn Geocoder>,
    store: Arc<dyn PointStore>,
}

impl SubmissionService {
    pub fn new(
        resolver: LinkResolver,
        geocoder: Arc<dyn Geocoder>,
        store: Arc<dyn PointStore>,
    ) -> Self {
        Self {
            resolver,
            geocoder,
            store,
        }
    }

    /// Validates, locates and stores one point.
    ///
    /// Validation runs before any network call, first failure wins:
    /// name, category presence, category membership, link presence.
    /// Explicit coordinates on the submission skip resolution altogether.
    pub async fn submit(
        &self,
        registry: &Registry,
        submission: Submission,
    ) -> Result<CreatedPoint, SubmissionError> {
        let name = submission.name.trim();
        let category = submission.category.trim();
        let link = submission.link.trim();

        if name.is_empty() {
            return Err(SubmissionError::MissingName);
        }
        if category.is_empty() {
            return Err(SubmissionError::MissingCategory);
        }
        if !registry.contains(category) {
            return Err(SubmissionError::InvalidCategory(category.to_string()));
        }

        let explicit = match (submission.lat, submission.lng) {
            (Some(lat), Some(lng)) => Coordinates::new(lat, lng),
            _ => None,
        };

        let (coordinates, debug) = match explicit {
            Some(c) => (c, None),
            None => {
                if link.is_empty() {
                    return Err(SubmissionError::MissingLink);
                }
                self.locate(link).await?
            }
        };

        let point = NewPoint {
            name: name.to_string(),
            category: category.to_string(),
            subcategory: submission.subcategory.trim().to_string(),
            note: submission.note.trim().to_string(),
            coordinates,
        };
        let id = self.store.create_point(&point).await?;
        info!(
            "Created point {} '{}' at {},{}",
            id,
            point.name,
            coordinates.lat(),
            coordinates.lng()
        );

        Ok(CreatedPoint {
            id,
            coordinates,
            debug,
        })
    }

    async fn locate(
        &self,
        link: &str,
    ) -> Result<(Coordinates, Option<ResolutionDebug>), SubmissionError> {
        if is_http_url(link) {
            let result = self.resolver.resolve(link).await;
            let diagnostics = ResolutionDebug::from(&result);
            return match result.coordinates {
                Some(c) => Ok((c, Some(diagnostics))),
                None => {
                    warn!("No coordinates for {} (reached {})", link, result.final_url);
                    Err(SubmissionError::Unresolvable {
                        message: RESOLUTION_HINT.to_string(),
                        debug: Some(diagnostics),
                    })
                }
            };
        }

        match self.geocoder.geocode(link).await {
            Some(c) => Ok((c, None)),
            None => {
                warn!("Geocoding found nothing for '{}'", link);
                Err(SubmissionError::Unresolvable {
                    message: RESOLUTION_HINT.to_string(),
                    debug: None,
                })
            }
        }
    }
}
