//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use roadmap_core::{
    Geocoder, LinkResolver, NotesLog, PageFetcher, PointStore, Registry, SubmissionService,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PointStore>,
    pub submissions: SubmissionService,
    pub notes: NotesLog,
    /// The configured categories with their default subcategories.
    /// Handlers clone it before merging anything request-specific.
    pub registry: Registry,
}

impl AppState {
    /// Wires the core services on top of the given port implementations.
    pub fn new(
        store: Arc<dyn PointStore>,
        fetcher: Arc<dyn PageFetcher>,
        geocoder: Arc<dyn Geocoder>,
        registry: Registry,
        max_hops: usize,
    ) -> Self {
        let resolver = LinkResolver::new(fetcher, max_hops);
        Self {
            submissions: SubmissionService::new(resolver, geocoder, store.clone()),
            notes: NotesLog::new(store.clone()),
            store,
            registry,
        }
    }
}
