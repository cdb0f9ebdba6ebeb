use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::dto::auth_dto::{LoginRequest, RegisterRequest, TokenResponse, UserResponse};
use crate::dto::dashboard_dto::{AnalyticsResponse, SessionHistoryItem};
use crate::dto::interview_dto::{
    FeedbackResponse, QuestionResponse, SessionResponse, StartInterviewRequest,
    SubmitAnswerRequest, SubmitAnswerResponse,
};
use crate::models::score::ScoreBand;
use crate::models::session::{Difficulty, SessionStatus};

#[derive(OpenApi)]
#[openapi(
    info(title = "MockMate API", description = "AI-powered interview practice"),
    paths(
        super::health::health,
        super::auth::register,
        super::auth::login,
        super::auth::logout,
        super::auth::me,
        super::interview::start_interview,
        super::interview::get_session,
        super::interview::submit_answer,
        super::dashboard::history,
        super::dashboard::analytics,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        TokenResponse,
        UserResponse,
        StartInterviewRequest,
        SubmitAnswerRequest,
        SubmitAnswerResponse,
        SessionResponse,
        QuestionResponse,
        FeedbackResponse,
        SessionHistoryItem,
        AnalyticsResponse,
        Difficulty,
        SessionStatus,
        ScoreBand,
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
