use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_CATEGORY: &str = "general";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewQuestion {
    pub id: Uuid,
    pub session_id: Uuid,
    pub question_text: String,
    pub category: String,
    pub suggested_duration_seconds: i32,
    pub order_index: i32,
    pub user_answer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InterviewQuestion {
    pub fn is_answered(&self) -> bool {
        self.user_answer.is_some()
    }
}

/// A question as produced by the AI oracle, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub text: String,
    pub category: String,
    pub suggested_duration_seconds: i32,
}
