//! services/api/src/adapters/ai_client.rs
//!
//! The client-side AI service. In production it goes through the proxy
//! endpoint so the server-held key is used; in development it may call the
//! upstream API directly with the user's own key.

use crate::adapters::gemini::{upstream_error_message, GeminiHttp};
use async_trait::async_trait;
use echoes_core::ports::{GenerativeAiService, PortError, PortResult};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, warn};

const FALLBACK_MESSAGE: &str = "AI service request failed";

/// Where generation requests are sent.
#[derive(Clone)]
pub enum AiRoute {
    /// Full URL of the proxy endpoint, e.g. `https://host/api/gemini`.
    Proxy { url: String },
    /// Straight to the provider with a user-supplied key.
    Direct { base_url: String, api_key: String },
}

pub struct GeminiClient {
    client: reqwest::Client,
    route: AiRoute,
    upstream: Option<GeminiHttp>,
}

#[derive(Deserialize)]
struct ProxyErrorBody {
    error: Option<String>,
    details: Option<String>,
}

impl GeminiClient {
    pub fn new(route: AiRoute, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let upstream = match &route {
            AiRoute::Direct { base_url, .. } => Some(GeminiHttp::new(base_url.clone(), timeout)?),
            AiRoute::Proxy { .. } => None,
        };
        Ok(Self {
            client,
            route,
            upstream,
        })
    }

    async fn via_proxy(&self, url: &str, endpoint: &str, body: Value) -> PortResult<Value> {
        let response = self
            .client
            .post(url)
            .json(&json!({ "endpoint": endpoint, "body": body }))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        let payload = response
            .bytes()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ProxyErrorBody>(&payload)
                .ok()
                .and_then(|body| body.details.or(body.error))
                .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
            warn!(status = status.as_u16(), "Proxy request failed");
            return Err(PortError::Upstream {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_slice(&payload).map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn direct(&self, api_key: &str, endpoint: &str, body: Value) -> PortResult<Value> {
        let upstream = self
            .upstream
            .as_ref()
            .ok_or_else(|| PortError::Unexpected("direct route is not configured".to_string()))?;
        let reply = upstream
            .forward(api_key, endpoint, &body)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if !reply.status.is_success() {
            let message =
                upstream_error_message(&reply.body).unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
            warn!(status = reply.status.as_u16(), "Direct upstream request failed");
            return Err(PortError::Upstream {
                status: reply.status.as_u16(),
                message,
            });
        }
        serde_json::from_slice(&reply.body).map_err(|e| {
            error!("Upstream returned a non-JSON success body: {}", e);
            PortError::Unexpected(e.to_string())
        })
    }
}

#[async_trait]
impl GenerativeAiService for GeminiClient {
    async fn generate(&self, endpoint: &str, body: Value) -> PortResult<Value> {
        match &self.route {
            AiRoute::Proxy { url } => self.via_proxy(url, endpoint, body).await,
            AiRoute::Direct { api_key, .. } => self.direct(api_key, endpoint, body).await,
        }
    }
}
