//! HTTP client for the business-domain API.
//!
//! Every [`Action`] maps to one `POST {base_url}{path}` with the action's
//! fields as the JSON body. A client is bound to a single task: the task id
//! travels in the `X-Task-Id` header so the platform can scope its state.

use async_trait::async_trait;
use officeclaw_core::action::Action;
use officeclaw_core::api::{ApiResponse, BusinessApi, WhoAmI};
use officeclaw_core::error::ApiError;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const TASK_HEADER: &str = "X-Task-Id";
const WHOAMI_PATH: &str = "/whoami";

/// Business-domain API client bound to one task.
#[derive(Clone)]
pub struct ErcClient {
    base_url: String,
    task_id: String,
    client: reqwest::Client,
}

impl ErcClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            task_id: String::new(),
            client,
        }
    }

    /// A copy of this client bound to `task_id`. The connection pool is shared.
    pub fn for_task(&self, task_id: impl Into<String>) -> Self {
        Self {
            base_url: self.base_url.clone(),
            task_id: task_id.into(),
            client: self.client.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = self.url(path);
        debug!(task_id = %self.task_id, %url, "API request");

        let response = self
            .client
            .post(&url)
            .header(TASK_HEADER, &self.task_id)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !(200..300).contains(&status) {
            let message = error_message(&text);
            warn!(task_id = %self.task_id, status, %path, error = %message, "API returned error");
            return Err(ApiError::domain(status, message));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| ApiError::Transport(format!("undecodable response from {path}: {e}")))
    }
}

/// The request body for an action: its fields without the routing tag.
pub fn request_body(action: &Action) -> Value {
    let mut body = serde_json::to_value(action).unwrap_or(Value::Null);
    if let Some(map) = body.as_object_mut() {
        map.remove("tool");
    }
    body
}

/// Human-readable message from an error body.
///
/// The platform answers `{"error": "..."}`; anything else is passed through.
fn error_message(text: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        for key in ["error", "detail", "message"] {
            if let Some(msg) = value.get(key).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        "empty error response".into()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl BusinessApi for ErcClient {
    async fn who_am_i(&self) -> Result<WhoAmI, ApiError> {
        let value = self.post(WHOAMI_PATH, &serde_json::json!({})).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Transport(format!("bad whoami: {e}")))
    }

    async fn dispatch(&self, action: &Action) -> Result<ApiResponse, ApiError> {
        let body = request_body(action);
        let value = self.post(action.kind().path(), &body).await?;
        Ok(ApiResponse::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request text.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if raw.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&raw).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn request_body_drops_tag() {
        let action: Action =
            serde_json::from_str(r#"{"tool":"/projects/get","id":"proj_acme_cv_poc"}"#).unwrap();
        let body = request_body(&action);
        assert!(body.get("tool").is_none());
        assert_eq!(body["id"], "proj_acme_cv_poc");
    }

    #[test]
    fn error_message_prefers_error_field() {
        assert_eq!(error_message(r#"{"error":"Only lead can change status"}"#), "Only lead can change status");
        assert_eq!(error_message(r#"{"detail":"not found"}"#), "not found");
        assert_eq!(error_message("plain failure"), "plain failure");
        assert_eq!(error_message(""), "empty error response");
    }

    #[test]
    fn for_task_shares_base_url() {
        let client = ErcClient::new("http://127.0.0.1:8000/", Duration::from_secs(5));
        let bound = client.for_task("t042");
        assert_eq!(bound.base_url(), "http://127.0.0.1:8000");
        assert_eq!(bound.task_id(), "t042");
        assert_eq!(bound.url("/projects/get"), "http://127.0.0.1:8000/projects/get");
    }

    #[tokio::test]
    async fn dispatch_posts_to_action_path() {
        let (base, server) = serve_once("200 OK", r#"{"projects":[{"id":"proj_acme_cv_poc"}]}"#).await;
        let client = ErcClient::new(base, Duration::from_secs(5)).for_task("t001");
        let action: Action =
            serde_json::from_str(r#"{"tool":"/projects/search","query":"CV","limit":5}"#).unwrap();

        let response = client.dispatch(&action).await.unwrap();
        assert_eq!(response.count("projects"), Some(1));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /projects/search"));
        assert!(request.to_ascii_lowercase().contains("x-task-id: t001"));
        assert!(request.contains(r#""query":"CV""#));
    }

    #[tokio::test]
    async fn non_success_status_is_domain_error() {
        let (base, _server) = serve_once("400 Bad Request", r#"{"error":"page limit exceeded: 10 > 5"}"#).await;
        let client = ErcClient::new(base, Duration::from_secs(5)).for_task("t002");
        let action: Action = serde_json::from_str(r#"{"tool":"/employees/list","limit":10}"#).unwrap();

        let err = client.dispatch(&action).await.unwrap_err();
        match err {
            ApiError::Domain { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "page limit exceeded: 10 > 5");
            }
            other => panic!("expected domain error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn who_am_i_decodes_identity() {
        let (base, _server) = serve_once(
            "200 OK",
            r#"{"current_user":"jane_doe","is_public":false,"today":"2025-04-01"}"#,
        )
        .await;
        let client = ErcClient::new(base, Duration::from_secs(5)).for_task("t003");

        let who = client.who_am_i().await.unwrap();
        assert_eq!(who.current_user.as_deref(), Some("jane_doe"));
        assert_eq!(who.today, "2025-04-01");
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = ErcClient::new(format!("http://{addr}"), Duration::from_secs(2)).for_task("t004");

        let err = client.who_am_i().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
