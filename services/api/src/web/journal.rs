//! services/api/src/web/journal.rs
//!
//! REST handlers over the draft store and the session log.

use crate::web::rest::{error_response, json_body, run_blocking, ErrorBody, HandlerError};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use echoes_core::{Draft, DraftInput, Insight, SessionInput, SessionSummary};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

//=========================================================================================
// Response Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentDraftResponse {
    pub draft: Option<Draft>,
    pub is_stale: bool,
    /// Relative age of the last edit, e.g. "5m ago".
    pub time_since: Option<String>,
}

//=========================================================================================
// Draft Handlers
//=========================================================================================

/// Get the in-progress draft.
#[utoipa::path(
    get,
    path = "/drafts/current",
    responses((status = 200, description = "Current draft; `draft` is null when there is none", body = CurrentDraftResponse))
)]
pub async fn get_current_draft_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CurrentDraftResponse>, HandlerError> {
    let response = run_blocking(move || {
        let draft = state.drafts.current_draft();
        let is_stale = draft
            .as_ref()
            .is_some_and(|d| state.drafts.is_draft_stale(d));
        let time_since = draft.as_ref().map(|d| state.drafts.time_since(d.updated_at));
        CurrentDraftResponse {
            draft,
            is_stale,
            time_since,
        }
    })
    .await?;
    Ok(Json(response))
}

/// Create or update the in-progress draft.
#[utoipa::path(
    put,
    path = "/drafts/current",
    request_body = DraftInput,
    responses(
        (status = 200, description = "The stored draft", body = Draft),
        (status = 400, description = "Malformed body or missing category", body = ErrorBody)
    )
)]
pub async fn save_draft_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DraftInput>, JsonRejection>,
) -> Result<Json<Draft>, HandlerError> {
    let input = json_body(payload)?;
    if input.category_id.trim().is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "categoryId is required"));
    }
    let draft = run_blocking(move || state.drafts.save_draft(input)).await?;
    Ok(Json(draft))
}

/// Discard the in-progress draft without archiving it.
#[utoipa::path(
    delete,
    path = "/drafts/current",
    responses((status = 204, description = "Draft cleared"))
)]
pub async fn clear_current_draft_handler(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, HandlerError> {
    run_blocking(move || state.drafts.clear_current_draft()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move the in-progress draft into history (blank drafts are dropped).
#[utoipa::path(
    post,
    path = "/drafts/current/archive",
    responses((status = 200, description = "History after archiving, most recent first", body = [Draft]))
)]
pub async fn archive_draft_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Draft>>, HandlerError> {
    let history = run_blocking(move || {
        state.drafts.archive_draft();
        state.drafts.draft_history()
    })
    .await?;
    Ok(Json(history))
}

/// Get the in-progress draft if it belongs to `category_id`.
#[utoipa::path(
    get,
    path = "/drafts/category/{category_id}",
    params(("category_id" = String, Path, description = "Emotional category id")),
    responses((status = 200, description = "The draft, or null", body = Draft))
)]
pub async fn draft_for_category_handler(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<String>,
) -> Result<Json<Option<Draft>>, HandlerError> {
    let draft = run_blocking(move || state.drafts.draft_for_category(&category_id)).await?;
    Ok(Json(draft))
}

/// List archived drafts, most recent first.
#[utoipa::path(
    get,
    path = "/drafts/history",
    responses((status = 200, description = "Archived drafts", body = [Draft]))
)]
pub async fn draft_history_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Draft>>, HandlerError> {
    Ok(Json(run_blocking(move || state.drafts.draft_history()).await?))
}

/// Remove one archived draft.
#[utoipa::path(
    delete,
    path = "/drafts/history/{id}",
    params(("id" = String, Path, description = "Draft id")),
    responses((status = 204, description = "Removed, or was not present"))
)]
pub async fn delete_draft_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, HandlerError> {
    run_blocking(move || state.drafts.delete_draft(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Session Handlers
//=========================================================================================

/// List completed sessions, most recent first.
#[utoipa::path(
    get,
    path = "/sessions",
    responses((status = 200, description = "Session summaries", body = [SessionSummary]))
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SessionSummary>>, HandlerError> {
    Ok(Json(run_blocking(move || state.sessions.history()).await?))
}

/// Record a completed session.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = SessionInput,
    responses(
        (status = 201, description = "The recorded summary", body = SessionSummary),
        (status = 400, description = "Malformed body or missing category", body = ErrorBody)
    )
)]
pub async fn record_session_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SessionInput>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let input = json_body(payload)?;
    if input.category_id.trim().is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "categoryId is required"));
    }
    let summary = run_blocking(move || state.sessions.record(input)).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Forget every recorded session.
#[utoipa::path(
    delete,
    path = "/sessions",
    responses((status = 204, description = "Session log cleared"))
)]
pub async fn clear_sessions_handler(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, HandlerError> {
    run_blocking(move || state.sessions.clear()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Returning-user insight derived from the session log.
#[utoipa::path(
    get,
    path = "/sessions/insight",
    responses((status = 200, description = "The insight, or null when there are no sessions", body = Insight))
)]
pub async fn insight_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Option<Insight>>, HandlerError> {
    Ok(Json(run_blocking(move || state.sessions.insight()).await?))
}
