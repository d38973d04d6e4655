//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{AirtableAdapter, NominatimGeocoder, ReqwestPageFetcher},
    config::Config,
    error::ApiError,
    web::{app_router, rest::ApiDoc, state::AppState},
};
use axum::{
    http::{header::CONTENT_TYPE, Method},
    Router,
};
use roadmap_core::Registry;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Identifies the service towards Airtable and the geocoder.
const SERVICE_USER_AGENT: &str = concat!("road-map/", env!("CARGO_PKG_VERSION"));

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let api_client = reqwest::Client::builder()
        .user_agent(SERVICE_USER_AGENT)
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .build()?;

    let store = Arc::new(AirtableAdapter::new(
        api_client.clone(),
        config.airtable_api_url.clone(),
        config.airtable_token.clone(),
        config.airtable_base_id.clone(),
        config.airtable_table_id.clone(),
    ));
    let geocoder = Arc::new(NominatimGeocoder::new(
        api_client,
        config.geocoder_url.clone(),
    ));
    let fetcher = Arc::new(ReqwestPageFetcher::new(config.fetch_timeout_secs)?);

    // --- 3. Build the Shared AppState ---
    let registry = Registry::new(&config.categories);
    info!("Categories: {:?}", registry.categories());
    let app_state = Arc::new(AppState::new(
        store,
        fetcher,
        geocoder,
        registry,
        config.max_hops,
    ));

    // --- 4. Create the Web Router ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(app_router(app_state, &config.static_dir))
        .layer(cors);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!("Serving static files from {}", config.static_dir.display());
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
