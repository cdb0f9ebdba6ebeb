use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::interview_dto::{StartInterviewRequest, SubmitAnswerRequest},
    error::Result,
    utils::token::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/interviews/start",
    request_body = StartInterviewRequest,
    responses(
        (status = 201, description = "Session created with generated questions", body = crate::dto::interview_dto::SessionResponse),
        (status = 400, description = "Invalid payload"),
        (status = 502, description = "AI returned an unusable response"),
        (status = 503, description = "AI service unavailable")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn start_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartInterviewRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let session = state
        .interview_service
        .start_session(claims.user_id()?, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    get,
    path = "/api/v1/interviews/{session_id}",
    params(("session_id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session with answers and feedback", body = crate::dto::interview_dto::SessionResponse),
        (status = 404, description = "Session not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let session = state
        .interview_service
        .get_session(claims.user_id()?, session_id)
        .await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/v1/interviews/{session_id}/questions/{question_id}/answer",
    params(
        ("session_id" = Uuid, Path, description = "Session ID"),
        ("question_id" = Uuid, Path, description = "Question ID")
    ),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer scored", body = crate::dto::interview_dto::SubmitAnswerResponse),
        (status = 400, description = "Already answered or session completed"),
        (status = 404, description = "Session or question not found"),
        (status = 409, description = "Another answer is being scored")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((session_id, question_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let result = state
        .interview_service
        .submit_answer(claims.user_id()?, session_id, question_id, payload)
        .await?;
    Ok(Json(result))
}
