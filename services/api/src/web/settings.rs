//! services/api/src/web/settings.rs
//!
//! REST handlers for the user API key and the theme preference.
//! The stored key itself is never returned.

use crate::web::rest::{error_response, json_body, run_blocking, ErrorBody, HandlerError};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use echoes_core::{ApiKeyTier, KeyValidation, ThemePreference, UsageInfo};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyStatus {
    pub has_key: bool,
    pub tier: ApiKeyTier,
    pub usage: UsageInfo,
}

#[derive(Deserialize, ToSchema)]
pub struct SaveApiKeyRequest {
    pub key: String,
    #[serde(default)]
    pub tier: ApiKeyTier,
}

#[derive(Deserialize, ToSchema)]
pub struct ValidateApiKeyRequest {
    #[serde(default)]
    pub key: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ThemeBody {
    pub theme: ThemePreference,
}

fn key_status(state: &AppState) -> ApiKeyStatus {
    ApiKeyStatus {
        has_key: state.api_keys.has_api_key(),
        tier: state.api_keys.api_key_tier(),
        usage: state.api_keys.usage_info(),
    }
}

//=========================================================================================
// API Key Handlers
//=========================================================================================

/// Whether a user key is stored, and its tier.
#[utoipa::path(
    get,
    path = "/api-key",
    responses((status = 200, description = "Key status", body = ApiKeyStatus))
)]
pub async fn get_api_key_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiKeyStatus>, HandlerError> {
    Ok(Json(run_blocking(move || key_status(&state)).await?))
}

/// Store a user key and its tier.
#[utoipa::path(
    put,
    path = "/api-key",
    request_body = SaveApiKeyRequest,
    responses(
        (status = 200, description = "Key stored", body = ApiKeyStatus),
        (status = 400, description = "Malformed body, empty key or invalid key format", body = ErrorBody)
    )
)]
pub async fn save_api_key_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SaveApiKeyRequest>, JsonRejection>,
) -> Result<Json<ApiKeyStatus>, HandlerError> {
    let req = json_body(payload)?;
    let saved = run_blocking(move || {
        state
            .api_keys
            .save_api_key(&req.key, req.tier)
            .map(|()| key_status(&state))
    })
    .await?;
    saved
        .map(Json)
        .map_err(|err| error_response(StatusCode::BAD_REQUEST, err.to_string()))
}

/// Forget the stored key and tier.
#[utoipa::path(
    delete,
    path = "/api-key",
    responses((status = 204, description = "Key cleared"))
)]
pub async fn clear_api_key_handler(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, HandlerError> {
    run_blocking(move || state.api_keys.clear_api_key()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Check a candidate key against the provider. Failures are reported in the body.
#[utoipa::path(
    post,
    path = "/api-key/validate",
    request_body = ValidateApiKeyRequest,
    responses(
        (status = 200, description = "Validation result", body = KeyValidation),
        (status = 400, description = "Malformed body", body = ErrorBody)
    )
)]
pub async fn validate_api_key_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ValidateApiKeyRequest>, JsonRejection>,
) -> Result<Json<KeyValidation>, HandlerError> {
    let req = json_body(payload)?;
    Ok(Json(state.api_keys.validate_api_key(&req.key).await))
}

//=========================================================================================
// Theme Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/theme",
    responses((status = 200, description = "Theme preference", body = ThemeBody))
)]
pub async fn get_theme_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ThemeBody>, HandlerError> {
    let theme = run_blocking(move || state.themes.theme()).await?;
    Ok(Json(ThemeBody { theme }))
}

#[utoipa::path(
    put,
    path = "/theme",
    request_body = ThemeBody,
    responses(
        (status = 200, description = "Stored preference", body = ThemeBody),
        (status = 400, description = "Malformed body or unknown theme", body = ErrorBody)
    )
)]
pub async fn set_theme_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ThemeBody>, JsonRejection>,
) -> Result<Json<ThemeBody>, HandlerError> {
    let body = json_body(payload)?;
    let theme = run_blocking(move || {
        state.themes.set_theme(body.theme);
        state.themes.theme()
    })
    .await?;
    Ok(Json(ThemeBody { theme }))
}
