mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use mockmate_backend::{
    error::Error,
    models::session::Difficulty,
    services::ai_service::AIService,
};
use serde_json::{json, Value as JsonValue};

#[derive(Clone)]
struct Llm {
    status: StatusCode,
    content: String,
    delay: Duration,
    seen: Arc<Mutex<Vec<(Option<String>, JsonValue)>>>,
}

async fn completions(
    State(llm): State<Llm>,
    headers: HeaderMap,
    Json(body): Json<JsonValue>,
) -> impl IntoResponse {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    llm.seen.lock().unwrap().push((auth, body));
    tokio::time::sleep(llm.delay).await;
    let reply = json!({
        "choices": [{ "message": { "role": "assistant", "content": llm.content } }]
    });
    (llm.status, Json(reply))
}

async fn mock_llm(status: StatusCode, content: &str, delay: Duration) -> (AIService, Llm) {
    let llm = Llm {
        status,
        content: content.to_string(),
        delay,
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/chat/completions", post(completions))
        .with_state(llm.clone());
    let base = common::spawn(app).await;

    let mut config = common::test_config(&base);
    config.llm_timeout_secs = 1;
    (AIService::new(reqwest::Client::new(), &config), llm)
}

#[tokio::test]
async fn generates_questions_from_fenced_reply() {
    let content = "```json\n{\"questions\": [\
        {\"question\": \"How does the borrow checker work?\", \"category\": \"Ownership\", \"duration_seconds\": 200},\
        {\"question\": \"Explain async cancellation.\", \"category\": \"async\"},\
        {\"question\": \"What is a trait object?\"}\
    ]}\n```";
    let (ai, llm) = mock_llm(StatusCode::OK, content, Duration::ZERO).await;

    let questions = ai
        .generate_questions("Rust Developer", Difficulty::Hard, 3)
        .await
        .unwrap();
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0].category, "ownership");
    assert_eq!(questions[0].suggested_duration_seconds, 200);
    assert_eq!(questions[2].suggested_duration_seconds, 240);

    let seen = llm.seen.lock().unwrap();
    let (auth, body) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer test-key"));
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["response_format"]["type"], "json_object");
    assert_eq!(body["messages"][0]["role"], "system");
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("Rust Developer"));
    assert!(prompt.contains("exactly 3"));
}

#[tokio::test]
async fn evaluates_answers() {
    let content = r#"Sure! {"score": 82, "overall_feedback": "Clear and correct.",
        "strengths": ["precise"], "improvements": ["mention Drop"]} Hope that helps."#;
    let (ai, llm) = mock_llm(StatusCode::OK, content, Duration::ZERO).await;

    let eval = ai
        .evaluate_answer("What is RAII?", "Scope-bound cleanup.", "Rust Developer", Difficulty::Easy)
        .await
        .unwrap();
    assert_eq!(eval.score, 82);
    assert_eq!(eval.strengths, vec!["precise".to_string()]);

    let seen = llm.seen.lock().unwrap();
    let prompt = seen[0].1["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("What is RAII?"));
    assert!(prompt.contains("Scope-bound cleanup."));
}

#[tokio::test]
async fn upstream_errors_are_unavailable() {
    let (ai, _) = mock_llm(StatusCode::INTERNAL_SERVER_ERROR, "", Duration::ZERO).await;
    let err = ai
        .generate_questions("Rust Developer", Difficulty::Easy, 3)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AiUnavailable(_)));
}

#[tokio::test]
async fn unusable_content_is_an_ai_response_error() {
    let (ai, _) = mock_llm(StatusCode::OK, "I'd rather not.", Duration::ZERO).await;
    let err = ai
        .evaluate_answer("Q", "A", "Rust Developer", Difficulty::Easy)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AiResponse(_)));
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let (ai, _) = mock_llm(StatusCode::OK, "{}", Duration::from_secs(3)).await;
    let err = ai
        .evaluate_answer("Q", "A", "Rust Developer", Difficulty::Easy)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(_)));
}

#[tokio::test]
async fn unreachable_upstream_is_unavailable() {
    let config = common::test_config("http://127.0.0.1:9");
    let ai = AIService::new(reqwest::Client::new(), &config);
    let err = ai
        .generate_questions("Rust Developer", Difficulty::Easy, 3)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AiUnavailable(_)));
}
