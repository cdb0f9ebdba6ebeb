mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::post, Json, Router};
use mockmate_backend::{
    client::{ClientError, InterviewRunner, MemoryTokenStore, MockMateClient},
    database::pool::{create_pool, run_migrations},
    dto::{
        auth_dto::{RegisterRequest, TokenResponse},
        interview_dto::{SessionResponse, StartInterviewRequest},
    },
    models::session::{Difficulty, SessionStatus},
    routes, AppState,
};
use reqwest::StatusCode;
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use uuid::Uuid;

/// Answers generation prompts with three questions. Answers are scored by
/// keyword: "excellent" scores 90, "garbage" gets an unusable reply and
/// "slow" is scored after a three second delay.
async fn fake_llm(Json(body): Json<JsonValue>) -> Json<JsonValue> {
    let system = body["messages"][0]["content"].as_str().unwrap_or_default();
    let content = if system.contains("Generate interview questions") {
        json!({"questions": [
            {"question": "What is ownership?", "category": "fundamentals", "duration_seconds": 120},
            {"question": "How do lifetimes work?", "category": "fundamentals"},
            {"question": "When would you use Arc<Mutex<T>>?", "category": "concurrency"}
        ]})
        .to_string()
    } else {
        let user = body["messages"][1]["content"].as_str().unwrap_or_default();
        if user.contains("garbage") {
            "I am unable to grade this answer.".to_string()
        } else {
            if user.contains("slow") {
                tokio::time::sleep(Duration::from_secs(3)).await;
            }
            let score = if user.contains("excellent") { 90 } else { 60 };
            format!(
                "```json\n{}\n```",
                json!({
                    "score": score,
                    "overall_feedback": "Good structure.",
                    "strengths": ["clear"],
                    "improvements": ["add an example"]
                })
            )
        }
    };
    Json(json!({ "choices": [{ "message": { "content": content } }] }))
}

struct Harness {
    base: String,
    pool: PgPool,
}

async fn harness() -> Harness {
    dotenvy::dotenv().ok();
    let llm = common::spawn(Router::new().route("/chat/completions", post(fake_llm))).await;
    let config = common::test_config(&llm);

    let pool = create_pool(&config.database_url).await.expect("pool");
    run_migrations(&pool).await.expect("migrations");
    let state = AppState::new(pool.clone(), config).expect("state");
    let base = common::spawn(routes::router(state)).await;
    Harness { base, pool }
}

impl Harness {
    async fn signed_in(&self) -> (MockMateClient, TokenResponse) {
        let client = MockMateClient::new(&self.base, Arc::new(MemoryTokenStore::new())).unwrap();
        let token = client
            .register(&RegisterRequest {
                email: format!("flow_{}@example.com", Uuid::new_v4()),
                name: "Flow Tester".into(),
                password: "analytical1".into(),
            })
            .await
            .expect("register");
        (client, token)
    }

    async fn status(&self, session_id: Uuid) -> SessionStatus {
        let raw: String = sqlx::query_scalar("SELECT status FROM interview_sessions WHERE id = $1")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await
            .expect("status");
        raw.parse().expect("known status")
    }

    async fn force_status(&self, session_id: Uuid, status: SessionStatus, age_secs: i64) {
        sqlx::query(
            "UPDATE interview_sessions SET status = $1, updated_at = NOW() - make_interval(secs => $2) WHERE id = $3",
        )
        .bind(status.as_str())
        .bind(age_secs as f64)
        .bind(session_id)
        .execute(&self.pool)
        .await
        .expect("force status");
    }

    fn answer_url(&self, session_id: Uuid, question_id: Uuid) -> String {
        format!(
            "{}/api/v1/interviews/{}/questions/{}/answer",
            self.base, session_id, question_id
        )
    }
}

async fn start(client: &MockMateClient) -> SessionResponse {
    client
        .start_interview(&StartInterviewRequest {
            role: "Rust Developer".into(),
            difficulty: Difficulty::Easy,
            question_count: 3,
        })
        .await
        .expect("start")
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a PostgreSQL instance"]
async fn interview_flow_end_to_end() {
    let h = harness().await;
    let base = h.base.clone();

    let client = MockMateClient::new(&base, Arc::new(MemoryTokenStore::new())).unwrap();
    let email = format!("flow_{}@Example.com", Uuid::new_v4());
    let register = RegisterRequest {
        email: email.clone(),
        name: "Flow Tester".into(),
        password: "analytical1".into(),
    };
    let token = client.register(&register).await.expect("register");
    assert_eq!(token.user.email, email.to_lowercase());

    let duplicate = client.register(&register).await.unwrap_err();
    assert!(matches!(duplicate, ClientError::Validation(_)));

    let empty = client.analytics().await.expect("analytics");
    assert_eq!(empty.total_sessions, 0);
    assert_eq!(empty.weekly_scores, vec![0.0; 7]);

    let mut runner = InterviewRunner::start(
        &client,
        &StartInterviewRequest {
            role: "Rust Developer".into(),
            difficulty: Difficulty::Easy,
            question_count: 3,
        },
    )
    .await
    .expect("start");
    assert_eq!(runner.session().questions.len(), 3);
    assert_eq!(runner.session().status, SessionStatus::InProgress);
    assert_eq!(runner.session().questions[1].suggested_duration_seconds, 120);

    let session_id = runner.session().id;
    let first = runner.current_question().unwrap().id;
    for answer in ["An excellent answer.", "A fine answer.", "Another fine answer."] {
        runner.submit(answer).await.expect("submit");
        runner.advance().expect("advance");
    }
    assert!(runner.is_complete());

    let again = client.submit_answer(session_id, first, "late").await.unwrap_err();
    assert!(matches!(again, ClientError::Validation(_)));

    let stored = client.get_session(session_id).await.expect("session");
    assert_eq!(stored.status, SessionStatus::Completed);
    assert_eq!(stored.final_score, Some(70.0));
    assert!(stored.completed_at.is_some());
    assert!(stored.questions.iter().all(|q| q.feedback.is_some()));

    let history = client.history(None).await.expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, session_id);
    assert_eq!(history[0].score, 70.0);

    let analytics = client.analytics().await.expect("analytics");
    assert_eq!(analytics.total_sessions, 1);
    assert_eq!(analytics.best_score, 70.0);
    assert_eq!(analytics.weekly_scores[6], 70.0);

    // a revoked token is refused even though it has not expired
    let old_token = token.access_token;
    client.logout().await.expect("logout");
    let resp = reqwest::Client::new()
        .get(format!("{}/api/v1/auth/me", base))
        .bearer_auth(&old_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: JsonValue = resp.json().await.unwrap();
    assert_eq!(body["error"], "token_revoked");
}

async fn post_answer(
    h: &Harness,
    token: &str,
    session_id: Uuid,
    question_id: Uuid,
    answer: &str,
) -> (StatusCode, JsonValue) {
    let resp = reqwest::Client::new()
        .post(h.answer_url(session_id, question_id))
        .bearer_auth(token)
        .json(&json!({ "answer": answer }))
        .send()
        .await
        .expect("answer request");
    let status = resp.status();
    (status, resp.json().await.unwrap_or(JsonValue::Null))
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a PostgreSQL instance"]
async fn dropped_request_still_records_the_answer() {
    let h = harness().await;
    let (client, token) = h.signed_in().await;
    let session = start(&client).await;

    let impatient = reqwest::Client::builder()
        .timeout(Duration::from_millis(500))
        .build()
        .unwrap();
    let err = impatient
        .post(h.answer_url(session.id, session.questions[0].id))
        .bearer_auth(&token.access_token)
        .json(&json!({ "answer": "a slow answer" }))
        .send()
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.status(session.id).await, SessionStatus::Feedback);
    let stored = client.get_session(session.id).await.unwrap();
    assert_eq!(stored.questions[0].user_answer.as_deref(), Some("a slow answer"));

    let next = client
        .submit_answer(session.id, session.questions[1].id, "the next answer")
        .await
        .expect("session still answerable");
    assert_eq!(next.answered_count, 2);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a PostgreSQL instance"]
async fn abandoned_claim_is_taken_over() {
    let h = harness().await;
    let (client, token) = h.signed_in().await;
    let session = start(&client).await;
    h.force_status(session.id, SessionStatus::Submitting, 3600).await;

    let (status, body) = post_answer(
        &h,
        &token.access_token,
        session.id,
        session.questions[0].id,
        "an answer",
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(h.status(session.id).await, SessionStatus::Feedback);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a PostgreSQL instance"]
async fn live_claim_rejects_second_submission() {
    let h = harness().await;
    let (client, token) = h.signed_in().await;
    let session = start(&client).await;
    h.force_status(session.id, SessionStatus::Submitting, 0).await;

    let (status, body) = post_answer(
        &h,
        &token.access_token,
        session.id,
        session.questions[0].id,
        "an answer",
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"],
        "An answer for this session is already being evaluated."
    );
    assert_eq!(h.status(session.id).await, SessionStatus::Submitting);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a PostgreSQL instance"]
async fn concurrent_submissions_score_only_one() {
    let h = harness().await;
    let (client, token) = h.signed_in().await;
    let session = start(&client).await;

    let (a, b) = tokio::join!(
        post_answer(&h, &token.access_token, session.id, session.questions[0].id, "slow one"),
        post_answer(&h, &token.access_token, session.id, session.questions[1].id, "slow two"),
    );
    let mut codes = vec![a.0, b.0];
    codes.sort();
    assert_eq!(codes, vec![StatusCode::OK, StatusCode::CONFLICT]);

    let stored = client.get_session(session.id).await.unwrap();
    assert_eq!(stored.answered_count(), 1);
    assert_eq!(stored.status, SessionStatus::Feedback);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a PostgreSQL instance"]
async fn scoring_failure_restores_previous_status() {
    let h = harness().await;
    let (client, token) = h.signed_in().await;
    let session = start(&client).await;
    let (q0, q1) = (session.questions[0].id, session.questions[1].id);

    let (status, _) = post_answer(&h, &token.access_token, session.id, q0, "garbage").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(h.status(session.id).await, SessionStatus::InProgress);

    client.submit_answer(session.id, q0, "fine").await.expect("retry");
    assert_eq!(h.status(session.id).await, SessionStatus::Feedback);

    let err = client.submit_answer(session.id, q1, "garbage").await.unwrap_err();
    assert!(matches!(err, ClientError::AiResponse(_)));
    assert_eq!(h.status(session.id).await, SessionStatus::Feedback);
    let stored = client.get_session(session.id).await.unwrap();
    assert!(stored.questions[1].user_answer.is_none());
    assert!(stored.questions[1].feedback.is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a PostgreSQL instance"]
async fn sessions_are_private_to_their_owner() {
    let h = harness().await;
    let (owner, _) = h.signed_in().await;
    let (stranger, stranger_token) = h.signed_in().await;
    let session = start(&owner).await;
    let other = start(&owner).await;

    assert!(matches!(
        stranger.get_session(session.id).await,
        Err(ClientError::Server { status: 404, .. })
    ));
    let (status, _) = post_answer(
        &h,
        &stranger_token.access_token,
        session.id,
        session.questions[0].id,
        "mine now",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // a question id from another session of the same user
    assert!(matches!(
        owner
            .submit_answer(session.id, other.questions[0].id, "wrong session")
            .await,
        Err(ClientError::Server { status: 404, .. })
    ));
    assert_eq!(h.status(session.id).await, SessionStatus::InProgress);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a PostgreSQL instance"]
async fn completed_session_rejects_answers() {
    let h = harness().await;
    let (client, token) = h.signed_in().await;
    let session = start(&client).await;

    let mut runner = InterviewRunner::resume(&client, session.id).await.unwrap();
    while !runner.is_complete() {
        runner.submit("an answer").await.expect("submit");
        runner.advance().expect("advance");
    }
    assert_eq!(h.status(session.id).await, SessionStatus::Completed);

    let (status, body) = post_answer(
        &h,
        &token.access_token,
        session.id,
        session.questions[2].id,
        "one more",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "This interview session is already completed.");
}
