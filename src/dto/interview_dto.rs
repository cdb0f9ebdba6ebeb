use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::feedback::QuestionFeedback;
use crate::models::question::InterviewQuestion;
use crate::models::score::ScoreBand;
use crate::models::session::{Difficulty, InterviewSession, SessionStatus};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct StartInterviewRequest {
    #[validate(
        length(min = 2, max = 100),
        custom(function = "crate::utils::validation::not_blank")
    )]
    pub role: String,
    pub difficulty: Difficulty,
    #[validate(range(min = 3, max = 10))]
    pub question_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitAnswerRequest {
    #[validate(
        length(min = 1, max = 5000),
        custom(function = "crate::utils::validation::not_blank")
    )]
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FeedbackResponse {
    pub id: Uuid,
    pub score: i32,
    pub band: ScoreBand,
    pub overall_feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuestionResponse {
    pub id: Uuid,
    pub question_text: String,
    pub category: String,
    pub suggested_duration_seconds: i32,
    pub order_index: i32,
    pub user_answer: Option<String>,
    pub feedback: Option<FeedbackResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub role: String,
    pub difficulty: String,
    pub question_count: i32,
    pub final_score: Option<f64>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub questions: Vec<QuestionResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SubmitAnswerResponse {
    pub question_id: Uuid,
    pub feedback: FeedbackResponse,
    pub is_last_question: bool,
    pub session_complete: bool,
    pub answered_count: i64,
    pub total_questions: i32,
}

impl From<QuestionFeedback> for FeedbackResponse {
    fn from(value: QuestionFeedback) -> Self {
        Self {
            id: value.id,
            score: value.score,
            band: ScoreBand::from_score(value.score as f64),
            overall_feedback: value.overall_feedback,
            strengths: value.strengths.0,
            improvements: value.improvements.0,
        }
    }
}

impl QuestionResponse {
    pub fn new(question: InterviewQuestion, feedback: Option<QuestionFeedback>) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text,
            category: question.category,
            suggested_duration_seconds: question.suggested_duration_seconds,
            order_index: question.order_index,
            user_answer: question.user_answer,
            feedback: feedback.map(Into::into),
        }
    }
}

impl SessionResponse {
    /// Pairs each question with its feedback row; questions keep their order.
    pub fn assemble(
        session: InterviewSession,
        questions: Vec<InterviewQuestion>,
        mut feedback: Vec<QuestionFeedback>,
    ) -> Self {
        let status = session.status();
        let questions = questions
            .into_iter()
            .map(|q| {
                let fb = feedback
                    .iter()
                    .position(|f| f.question_id == q.id)
                    .map(|idx| feedback.swap_remove(idx));
                QuestionResponse::new(q, fb)
            })
            .collect();

        Self {
            id: session.id,
            role: session.role,
            difficulty: session.difficulty,
            question_count: session.question_count,
            final_score: session.final_score,
            status,
            created_at: session.created_at,
            completed_at: session.completed_at,
            questions,
        }
    }

    pub fn answered_count(&self) -> usize {
        self.questions.iter().filter(|q| q.user_answer.is_some()).count()
    }

    /// The first question without an answer, in interview order.
    pub fn next_unanswered(&self) -> Option<&QuestionResponse> {
        self.questions.iter().find(|q| q.user_answer.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn session() -> InterviewSession {
        InterviewSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role: "Backend Engineer".into(),
            difficulty: "Hard".into(),
            question_count: 2,
            final_score: None,
            status: "feedback".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        }
    }

    fn question(session_id: Uuid, idx: i32, answer: Option<&str>) -> InterviewQuestion {
        InterviewQuestion {
            id: Uuid::new_v4(),
            session_id,
            question_text: format!("Question {}", idx),
            category: "general".into(),
            suggested_duration_seconds: 240,
            order_index: idx,
            user_answer: answer.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn assemble_attaches_feedback_to_its_question() {
        let s = session();
        let q0 = question(s.id, 0, Some("my answer"));
        let q1 = question(s.id, 1, None);
        let fb = QuestionFeedback {
            id: Uuid::new_v4(),
            question_id: q0.id,
            score: 85,
            overall_feedback: "Solid".into(),
            strengths: Json(vec!["clear".into()]),
            improvements: Json(vec![]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let q1_id = q1.id;

        let resp = SessionResponse::assemble(s, vec![q0, q1], vec![fb]);
        assert_eq!(resp.status, SessionStatus::Feedback);
        assert_eq!(resp.questions[0].feedback.as_ref().unwrap().band, ScoreBand::Strong);
        assert!(resp.questions[1].feedback.is_none());
        assert_eq!(resp.answered_count(), 1);
        assert_eq!(resp.next_unanswered().unwrap().id, q1_id);
    }

    #[test]
    fn start_request_bounds() {
        let mut req = StartInterviewRequest {
            role: "Rust Developer".into(),
            difficulty: Difficulty::Easy,
            question_count: 3,
        };
        assert!(req.validate().is_ok());
        req.question_count = 11;
        assert!(req.validate().is_err());
        req.question_count = 2;
        assert!(req.validate().is_err());
        req.question_count = 10;
        req.role = "R".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn answer_length_bounds() {
        assert!(SubmitAnswerRequest { answer: "x".repeat(5000) }.validate().is_ok());
        assert!(SubmitAnswerRequest { answer: "x".repeat(5001) }.validate().is_err());
        assert!(SubmitAnswerRequest { answer: String::new() }.validate().is_err());
    }
}
