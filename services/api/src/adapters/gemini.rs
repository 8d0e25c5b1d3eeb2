//! services/api/src/adapters/gemini.rs
//!
//! Server-side access to the Gemini `v1beta` REST API: raw request forwarding
//! for the proxy endpoint, and the list-models probe behind key validation.
//! Keys always travel in the `x-goog-api-key` header so they never appear in
//! URLs or access logs.

use async_trait::async_trait;
use bytes::Bytes;
use echoes_core::ports::{ApiKeyVerifier, ProbeOutcome};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const API_KEY_HEADER: &str = "x-goog-api-key";
const API_VERSION: &str = "v1beta";

/// A verbatim upstream reply.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[derive(Clone)]
pub struct GeminiHttp {
    client: reqwest::Client,
    base_url: String,
}

impl GeminiHttp {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn method_url(&self, endpoint: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_VERSION, endpoint.trim_start_matches('/'))
    }

    /// POSTs `body` to `<base>/v1beta/<endpoint>` and hands back whatever came back.
    pub async fn forward(
        &self,
        api_key: &str,
        endpoint: &str,
        body: &Value,
    ) -> Result<UpstreamReply, reqwest::Error> {
        let url = self.method_url(endpoint);
        debug!(endpoint, "Forwarding request upstream");
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;
        debug!(endpoint, status = status.as_u16(), "Upstream replied");
        Ok(UpstreamReply {
            status,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl ApiKeyVerifier for GeminiHttp {
    async fn probe(&self, api_key: &str) -> ProbeOutcome {
        let response = match self
            .client
            .get(self.method_url("models"))
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return ProbeOutcome::Unreachable(e.to_string()),
        };

        let status = response.status();
        if status.is_success() {
            return ProbeOutcome::Accepted;
        }
        let message = match response.bytes().await {
            Ok(body) => upstream_error_message(&body),
            Err(_) => None,
        };
        ProbeOutcome::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

/// Extracts `error.message` from a Google API error envelope.
pub fn upstream_error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "AIzaSyA1234567890abcdefghijklmnopqrstu";

    fn http(server: &MockServer) -> GeminiHttp {
        GeminiHttp::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn method_url_joins_version_and_endpoint() {
        let gemini = GeminiHttp::new("https://example.test/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            gemini.method_url("/models/gemini-2.0-flash:generateContent"),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn extracts_google_error_message() {
        let body = br#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(upstream_error_message(body).as_deref(), Some("API key not valid."));
        assert_eq!(upstream_error_message(b"<html>"), None);
    }

    #[tokio::test]
    async fn probe_accepts_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .and(header(API_KEY_HEADER, KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(http(&server).probe(KEY).await, ProbeOutcome::Accepted);
    }

    #[tokio::test]
    async fn probe_reports_rejection_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "API key not valid. Please pass a valid API key."}
            })))
            .mount(&server)
            .await;

        assert_eq!(
            http(&server).probe(KEY).await,
            ProbeOutcome::Rejected {
                status: 400,
                message: Some("API key not valid. Please pass a valid API key.".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn probe_reports_unreachable_provider() {
        // Bind and immediately release a port so nothing is listening on it.
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let gemini = GeminiHttp::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap();
        assert!(matches!(gemini.probe(KEY).await, ProbeOutcome::Unreachable(_)));
    }

    #[tokio::test]
    async fn forward_relays_status_and_body() {
        let server = MockServer::start().await;
        let request = json!({"contents": [{"parts": [{"text": "hi"}]}]});
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(header(API_KEY_HEADER, KEY))
            .and(body_json(&request))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let reply = http(&server)
            .forward(KEY, "models/gemini-2.0-flash:generateContent", &request)
            .await
            .unwrap();
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.content_type.as_deref(), Some("application/json"));
        let body: Value = serde_json::from_slice(&reply.body).unwrap();
        assert_eq!(body, json!({"candidates": []}));
    }
}
