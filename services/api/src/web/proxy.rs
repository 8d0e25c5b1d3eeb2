//! services/api/src/web/proxy.rs
//!
//! `POST /api/gemini`: forwards a request body to the upstream generative-AI
//! API using the server-held key, so the key never reaches the browser.

use crate::adapters::gemini::upstream_error_message;
use crate::web::rest::{error_response, ErrorBody, HandlerError};
use crate::web::state::AppState;
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tracing::{error, info, warn};
use utoipa::ToSchema;

/// Upstream error text is cut to this many characters before being relayed.
const MAX_DETAILS_LEN: usize = 512;

#[derive(Deserialize, ToSchema)]
pub struct ProxyRequest {
    /// Provider method path below `v1beta/`, e.g. `models/gemini-2.0-flash:generateContent`.
    pub endpoint: Option<String>,
    /// JSON forwarded unchanged.
    #[schema(value_type = Object)]
    pub body: Option<Value>,
}

fn endpoint_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._:/-]*$").expect("endpoint pattern is valid")
    })
}

/// Endpoints stay below the versioned API root: no traversal, no query strings,
/// no empty segments.
pub fn is_allowed_endpoint(endpoint: &str) -> bool {
    endpoint_pattern().is_match(endpoint) && !endpoint.contains("..") && !endpoint.contains("//")
}

/// Proxy a request to the generative-AI API.
#[utoipa::path(
    post,
    path = "/api/gemini",
    request_body = ProxyRequest,
    responses(
        (status = 200, description = "Upstream reply, relayed verbatim"),
        (status = 400, description = "Missing or invalid endpoint/body", body = ErrorBody),
        (status = 405, description = "Only POST is accepted"),
        (status = 500, description = "Server misconfiguration or internal failure", body = ErrorBody)
    )
)]
pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProxyRequest>, JsonRejection>,
) -> Result<Response, HandlerError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected proxy request: {}", rejection.body_text());
        error_response(StatusCode::BAD_REQUEST, "Invalid JSON body")
    })?;

    let endpoint = request
        .endpoint
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());
    let (endpoint, body) = match (endpoint, request.body) {
        (Some(endpoint), Some(body)) if !body.is_null() => (endpoint, body),
        _ => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "Missing required fields: endpoint and body",
            ))
        }
    };
    if !is_allowed_endpoint(&endpoint) {
        warn!(endpoint = %endpoint, "Rejected proxy endpoint");
        return Err(error_response(StatusCode::BAD_REQUEST, "Invalid endpoint"));
    }

    let Some(api_key) = state.config.gemini_api_key.as_deref() else {
        error!("GEMINI_API_KEY is not configured; cannot proxy");
        return Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server configuration error",
        ));
    };

    let reply = state
        .upstream
        .forward(api_key, &endpoint, &body)
        .await
        .map_err(|e| {
            error!(endpoint = %endpoint, error = %e, "Upstream request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        })?;

    if !reply.status.is_success() {
        let details = upstream_error_message(&reply.body).unwrap_or_else(|| {
            String::from_utf8_lossy(&reply.body)
                .trim()
                .chars()
                .take(MAX_DETAILS_LEN)
                .collect()
        });
        warn!(endpoint = %endpoint, status = reply.status.as_u16(), "Upstream returned an error");
        return Ok((
            reply.status,
            Json(ErrorBody {
                error: "Upstream API error".to_string(),
                details: Some(details),
            }),
        )
            .into_response());
    }

    info!(endpoint = %endpoint, status = reply.status.as_u16(), "Proxied request");
    let content_type = reply
        .content_type
        .unwrap_or_else(|| "application/json".to_string());
    Response::builder()
        .status(reply.status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(reply.body))
        .map_err(|e| {
            error!(error = %e, "Failed to build proxied response");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        })
}
