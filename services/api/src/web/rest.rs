//! services/api/src/web/rest.rs
//!
//! Shared response types, the health check, and the master definition for
//! the OpenAPI specification.

use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};
use serde::Serialize;
use tracing::{error, warn};
use utoipa::{OpenApi, ToSchema};

use crate::web::{journal, proxy, settings};
use echoes_core::{
    ApiKeyTier, Draft, DraftInput, Insight, KeyValidation, SessionInput, SessionSummary,
    ThemePreference, UsageInfo,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        proxy::proxy_handler,
        journal::get_current_draft_handler,
        journal::save_draft_handler,
        journal::clear_current_draft_handler,
        journal::archive_draft_handler,
        journal::draft_for_category_handler,
        journal::draft_history_handler,
        journal::delete_draft_handler,
        journal::list_sessions_handler,
        journal::record_session_handler,
        journal::insight_handler,
        journal::clear_sessions_handler,
        settings::get_api_key_handler,
        settings::save_api_key_handler,
        settings::clear_api_key_handler,
        settings::validate_api_key_handler,
        settings::get_theme_handler,
        settings::set_theme_handler,
    ),
    components(
        schemas(
            ErrorBody, HealthResponse, proxy::ProxyRequest,
            Draft, DraftInput, journal::CurrentDraftResponse,
            SessionSummary, SessionInput, Insight,
            ApiKeyTier, UsageInfo, KeyValidation,
            settings::ApiKeyStatus, settings::SaveApiKeyRequest, settings::ValidateApiKeyRequest,
            ThemePreference, settings::ThemeBody,
        )
    ),
    tags(
        (name = "ECHOES API", description = "Journal persistence and the generative-AI proxy.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Payload Structs
//=========================================================================================

/// The error envelope returned by every endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub type HandlerError = (StatusCode, Json<ErrorBody>);

pub fn error_response(status: StatusCode, error: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorBody {
            error: error.into(),
            details: None,
        }),
    )
}

/// Unwraps a JSON body, answering 400 with the error envelope instead of axum's plain-text rejection.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, HandlerError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        let details = rejection.body_text();
        warn!("Rejected request body: {}", details);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "Invalid JSON body".to_string(),
                details: Some(details),
            }),
        )
    })
}

/// Runs a store operation on the blocking pool; file-backed writes must not stall a runtime worker.
pub async fn run_blocking<T, F>(task: F) -> Result<T, HandlerError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.map_err(|e| {
        error!(error = %e, "Store task failed");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    })
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    version: String,
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
