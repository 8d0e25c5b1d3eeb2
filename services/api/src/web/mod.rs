//! services/api/src/web/mod.rs
//!
//! HTTP surface: the generative-AI proxy and the journal REST endpoints.

pub mod journal;
pub mod proxy;
pub mod rest;
pub mod settings;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::web::state::AppState;

pub use proxy::proxy_handler;

/// Drawings arrive as data URLs inside draft bodies.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// CORS for an explicit origin allow-list; `Content-Type` is the only custom header.
fn cors_layer(origins: &[String], methods: Vec<Method>) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers([CONTENT_TYPE])
}

/// Builds the complete API router over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    let origins = state.config.allowed_origins.clone();

    let proxy_routes = Router::new()
        .route("/api/gemini", post(proxy_handler))
        .layer(cors_layer(&origins, vec![Method::POST, Method::OPTIONS]));

    let journal_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route(
            "/drafts/current",
            get(journal::get_current_draft_handler)
                .put(journal::save_draft_handler)
                .delete(journal::clear_current_draft_handler),
        )
        .route("/drafts/current/archive", post(journal::archive_draft_handler))
        .route(
            "/drafts/category/{category_id}",
            get(journal::draft_for_category_handler),
        )
        .route("/drafts/history", get(journal::draft_history_handler))
        .route("/drafts/history/{id}", delete(journal::delete_draft_handler))
        .route(
            "/sessions",
            get(journal::list_sessions_handler)
                .post(journal::record_session_handler)
                .delete(journal::clear_sessions_handler),
        )
        .route("/sessions/insight", get(journal::insight_handler))
        .route(
            "/api-key",
            get(settings::get_api_key_handler)
                .put(settings::save_api_key_handler)
                .delete(settings::clear_api_key_handler),
        )
        .route("/api-key/validate", post(settings::validate_api_key_handler))
        .route(
            "/theme",
            get(settings::get_theme_handler).put(settings::set_theme_handler),
        )
        .layer(cors_layer(
            &origins,
            vec![
                Method::GET,
                Method::PUT,
                Method::POST,
                Method::DELETE,
                Method::OPTIONS,
            ],
        ));

    Router::new()
        .merge(proxy_routes)
        .merge(journal_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

