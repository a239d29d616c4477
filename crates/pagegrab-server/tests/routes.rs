use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pagegrab_core::{Assistant, AssistantError, ChangeEndpoint, PromptRequest, RunMode};
use serde_json::{json, Value};

/// Answers every prompt with a fixed reply and counts calls
struct StubAssistant {
    unreachable: bool,
    calls: Mutex<Vec<PromptRequest>>,
}

impl StubAssistant {
    fn healthy() -> Arc<Self> {
        Arc::new(Self { unreachable: false, calls: Mutex::new(Vec::new()) })
    }

    fn down() -> Arc<Self> {
        Arc::new(Self { unreachable: true, calls: Mutex::new(Vec::new()) })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Assistant for StubAssistant {
    fn base_url(&self) -> &str {
        "http://127.0.0.1:3001"
    }

    async fn run_prompt(&self, request: PromptRequest) -> Result<String, AssistantError> {
        self.calls.lock().unwrap().push(request);
        if self.unreachable {
            return Err(AssistantError::Unreachable {
                base_url: self.base_url().to_string(),
            });
        }
        Ok("Edited components/cta.tsx".to_string())
    }
}

async fn serve(mode: RunMode, assistant: Arc<StubAssistant>) -> String {
    let endpoint = Arc::new(ChangeEndpoint::new(mode, assistant));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, pagegrab_server::router(endpoint)).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn post(url: &str, body: &str) -> (u16, String) {
    let response = reqwest::Client::new()
        .post(url)
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.text().await.unwrap())
}

#[tokio::test]
async fn test_apply_success() {
    let assistant = StubAssistant::healthy();
    let base = serve(RunMode::Development, assistant.clone()).await;

    let (status, body) = post(&format!("{}/api/opencode/apply", base), r#"{"message":"green button"}"#).await;

    assert_eq!(status, 200);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({ "success": true, "response": "Edited components/cta.tsx" }));
    assert_eq!(assistant.call_count(), 1);
}

#[tokio::test]
async fn test_all_route_aliases_served() {
    let assistant = StubAssistant::healthy();
    let base = serve(RunMode::Development, assistant.clone()).await;

    for route in ["apply", "change", "commit"] {
        let (status, _) = post(&format!("{}/api/opencode/{}", base, route), r#"{"message":"x"}"#).await;
        assert_eq!(status, 200, "route {}", route);
    }
    assert_eq!(assistant.call_count(), 3);

    let (status, _) = post(&format!("{}/api/opencode/push", base), r#"{"message":"x"}"#).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_empty_message_is_bad_request() {
    let assistant = StubAssistant::healthy();
    let base = serve(RunMode::Development, assistant.clone()).await;

    let (status, body) = post(&format!("{}/api/opencode/apply", base), r#"{"message":""}"#).await;

    assert_eq!(status, 400);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({ "success": false, "error": "Message is required" }));
    assert_eq!(assistant.call_count(), 0);
}

#[tokio::test]
async fn test_production_is_not_found() {
    let assistant = StubAssistant::healthy();
    let base = serve(RunMode::Production, assistant.clone()).await;

    for body in [r#"{"message":"valid request"}"#, r#"{}"#] {
        let (status, text) = post(&format!("{}/api/opencode/apply", base), body).await;
        assert_eq!(status, 404);
        assert!(text.is_empty());
    }
    assert_eq!(assistant.call_count(), 0);
}

#[tokio::test]
async fn test_unreachable_assistant_is_service_unavailable() {
    let base = serve(RunMode::Development, StubAssistant::down()).await;

    let (status, body) = post(&format!("{}/api/opencode/commit", base), r#"{"message":"x"}"#).await;

    assert_eq!(status, 503);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], false);
    assert!(body["response"].as_str().unwrap().contains("http://127.0.0.1:3001"));
}

#[tokio::test]
async fn test_malformed_body_is_internal_error() {
    let base = serve(RunMode::Development, StubAssistant::healthy()).await;

    let (status, body) = post(&format!("{}/api/opencode/apply", base), "{not json").await;

    assert_eq!(status, 500);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_health() {
    let base = serve(RunMode::Production, StubAssistant::healthy()).await;
    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}
