//! services/api/src/bin/api.rs

use echoes_api::{
    adapters::FileStore,
    config::Config,
    error::ApiError,
    web::{rest::ApiDoc, router, state::AppState},
};
use echoes_core::{clock::SystemClock, ports::KeyValueStore};
use axum::Router;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open Journal Storage ---
    info!("Opening journal data at {}", config.data_path.display());
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.data_path));

    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; /api/gemini will answer 500 until it is configured");
    }

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(config.clone(), store, Arc::new(SystemClock))?);
    info!(origins = ?config.allowed_origins, "CORS allow-list configured");

    // --- 4. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
