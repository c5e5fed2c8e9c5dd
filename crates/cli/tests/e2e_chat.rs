//! End-to-end tests for the ClinicChat pipeline.
//!
//! Each test starts a local stand-in for the OpenAI chat completions
//! endpoint, wires the real provider, assistant, and HTTP router against
//! it from config, and drives `/api/chat` in-process.

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::post,
};
use clinicchat_assistant::{DECLINE_SENTENCE, MEDICAL_DIRECTIVE, MedicalAssistant};
use clinicchat_config::{AppConfig, ProviderConfig};
use clinicchat_gateway::auth::StaticTokenAuthorizer;
use clinicchat_gateway::{GatewayState, build_router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

// ── Upstream stand-in ───────────────────────────────────────────────────

struct Upstream {
    status: u16,
    body: Value,
    seen: Mutex<Vec<Value>>,
}

impl Upstream {
    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn last_request(&self) -> Value {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

async fn completions(State(up): State<Arc<Upstream>>, Json(body): Json<Value>) -> impl IntoResponse {
    up.seen.lock().unwrap().push(body);
    (StatusCode::from_u16(up.status).unwrap(), Json(up.body.clone()))
}

async fn spawn_upstream(status: u16, body: Value) -> (Arc<Upstream>, String) {
    let upstream = Arc::new(Upstream {
        status,
        body,
        seen: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (upstream, format!("http://{addr}/v1"))
}

fn reply_body(text: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "model": "gpt-3.5-turbo",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 180, "completion_tokens": 42, "total_tokens": 222}
    })
}

// ── Gateway wiring ──────────────────────────────────────────────────────

fn gateway(base_url: String) -> Router {
    let mut config = AppConfig::default();
    config.api_key = Some("sk-test".into());
    config.auth.require_auth = false;
    config.providers.insert(
        "openai".into(),
        ProviderConfig {
            api_url: Some(base_url),
            timeout_secs: 5,
            ..ProviderConfig::default()
        },
    );

    let provider = clinicchat_providers::build_from_config(&config).unwrap();
    let assistant = Arc::new(MedicalAssistant::from_config(provider, &config));
    let authorizer = Arc::new(StaticTokenAuthorizer::from_config(&config.auth));
    let state = Arc::new(GatewayState::new(assistant, authorizer, true));
    build_router(state, &config.gateway)
}

async fn post_chat(app: &Router, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ── Scenarios ───────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_health_question_gets_reply() {
    let advice = "Rest, stay hydrated, and see a doctor if the fever exceeds 39C or lasts more than three days.";
    let (upstream, base) = spawn_upstream(200, reply_body(advice)).await;
    let app = gateway(base);

    let (status, body) = post_chat(
        &app,
        json!({"message": "I have a headache and fever, what should I do?", "history": []}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "reply": advice}));
    assert_eq!(upstream.calls(), 1);

    let sent = upstream.last_request();
    assert_eq!(sent["model"], "gpt-3.5-turbo");
    assert_eq!(sent["max_tokens"], 500);
    assert_eq!(sent["n"], 1);
    assert!((sent["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-3);

    let messages = sent["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[0]["content"], MEDICAL_DIRECTIVE);
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(
        messages[1]["content"],
        "I have a headache and fever, what should I do?"
    );
}

#[tokio::test]
async fn e2e_empty_message_is_rejected_without_upstream_call() {
    let (upstream, base) = spawn_upstream(200, reply_body("unused")).await;
    let app = gateway(base);

    let (status, body) = post_chat(&app, json!({"message": "", "history": []})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "message": "Message is required"}));
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn e2e_off_topic_question_is_declined_by_directive() {
    let (upstream, base) = spawn_upstream(200, reply_body(DECLINE_SENTENCE)).await;
    let app = gateway(base);

    let (status, body) = post_chat(
        &app,
        json!({"message": "What's the weather in Paris tomorrow?", "history": []}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], DECLINE_SENTENCE);

    let sent = upstream.last_request();
    let directive = sent["messages"][0]["content"].as_str().unwrap();
    assert!(directive.contains(DECLINE_SENTENCE));
}

#[tokio::test]
async fn e2e_quota_exhaustion_is_429() {
    let (upstream, base) = spawn_upstream(
        429,
        json!({"error": {
            "message": "You exceeded your current quota, please check your plan and billing details.",
            "type": "insufficient_quota",
            "param": null,
            "code": "insufficient_quota"
        }}),
    )
    .await;
    let app = gateway(base);

    let (status, body) = post_chat(&app, json!({"message": "Is ibuprofen safe?"})).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body,
        json!({"success": false, "message": "API quota exceeded. Please try again later."})
    );
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn e2e_upstream_error_is_500_and_not_retried() {
    let (upstream, base) = spawn_upstream(
        500,
        json!({"error": {"message": "The server had an error while processing your request.", "type": "server_error"}}),
    )
    .await;
    let app = gateway(base);

    let (status, body) = post_chat(&app, json!({"message": "My ankle is swollen"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Failed to get response from chatbot");
    assert!(body["error"].is_string());
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn e2e_history_is_forwarded_between_directive_and_message() {
    let (upstream, base) = spawn_upstream(200, reply_body("Keep it elevated and iced.")).await;
    let app = gateway(base);

    let history = json!([
        {"role": "user", "content": "I twisted my ankle"},
        {"role": "assistant", "content": "I'm sorry to hear that. Is it swollen?"}
    ]);
    let (status, _) = post_chat(
        &app,
        json!({"message": "Yes, quite a bit", "history": history}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let sent = upstream.last_request();
    let roles: Vec<&str> = sent["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, ["system", "user", "assistant", "user"]);
    assert_eq!(sent["messages"][1]["content"], "I twisted my ankle");
    assert_eq!(sent["messages"][3]["content"], "Yes, quite a bit");
}

#[tokio::test]
async fn e2e_repeated_requests_are_independent() {
    let (upstream, base) = spawn_upstream(200, reply_body("Drink warm fluids.")).await;
    let app = gateway(base);
    let request = json!({
        "message": "What helps a sore throat?",
        "history": [{"role": "user", "content": "Hi"}]
    });

    let first = post_chat(&app, request.clone()).await;
    let second = post_chat(&app, request).await;

    assert_eq!(first, second);
    assert_eq!(upstream.calls(), 2);
    let seen = upstream.seen.lock().unwrap();
    assert_eq!(seen[0], seen[1]);
    assert_eq!(seen[1]["messages"].as_array().unwrap().len(), 3);
}
