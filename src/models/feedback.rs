use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub const MAX_FEEDBACK_ITEMS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionFeedback {
    pub id: Uuid,
    pub question_id: Uuid,
    pub score: i32,
    pub overall_feedback: String,
    pub strengths: Json<Vec<String>>,
    pub improvements: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Evaluation of one answer as returned by the AI oracle, already
/// clamped and truncated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEvaluation {
    pub score: i32,
    pub overall_feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}
