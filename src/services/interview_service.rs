use chrono::{Duration, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::dto::interview_dto::{
    FeedbackResponse, SessionResponse, StartInterviewRequest, SubmitAnswerRequest,
    SubmitAnswerResponse,
};
use crate::error::{Error, Result};
use crate::models::feedback::{AnswerEvaluation, QuestionFeedback};
use crate::models::question::InterviewQuestion;
use crate::models::score::mean_score;
use crate::models::session::{Difficulty, InterviewSession, SessionStatus};
use crate::services::ai_service::AIService;

const SESSION_COLUMNS: &str = "id, user_id, role, difficulty, question_count, final_score, status, created_at, updated_at, completed_at";
const QUESTION_COLUMNS: &str = "id, session_id, question_text, category, suggested_duration_seconds, order_index, user_answer, created_at, updated_at";
const FEEDBACK_COLUMNS: &str = "id, question_id, score, overall_feedback, strengths, improvements, created_at, updated_at";

const MIN_STALE_CLAIM_SECS: i64 = 10;

/// Drives the interview session lifecycle: generation, scoring, completion.
#[derive(Clone)]
pub struct InterviewService {
    pool: PgPool,
    ai: AIService,
    stale_claim_after: Duration,
}

struct RecordedAnswer {
    feedback: QuestionFeedback,
    answered_count: i64,
    session_complete: bool,
}

impl InterviewService {
    pub fn new(pool: PgPool, ai: AIService) -> Self {
        let stale_claim_after = Duration::from_std(ai.timeout() * 2)
            .unwrap_or_else(|_| Duration::minutes(1))
            .max(Duration::seconds(MIN_STALE_CLAIM_SECS));
        Self {
            pool,
            ai,
            stale_claim_after,
        }
    }

    pub async fn start_session(
        &self,
        user_id: Uuid,
        payload: StartInterviewRequest,
    ) -> Result<SessionResponse> {
        let role = payload.role.trim().to_string();
        let generated = self
            .ai
            .generate_questions(&role, payload.difficulty, payload.question_count as usize)
            .await?;

        let mut tx = self.pool.begin().await?;

        let session = sqlx::query_as::<_, InterviewSession>(&format!(
            r#"
            INSERT INTO interview_sessions (id, user_id, role, difficulty, question_count, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&role)
        .bind(payload.difficulty.as_str())
        .bind(generated.len() as i32)
        .bind(SessionStatus::Started.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let mut questions = Vec::with_capacity(generated.len());
        for (idx, q) in generated.into_iter().enumerate() {
            let question = sqlx::query_as::<_, InterviewQuestion>(&format!(
                r#"
                INSERT INTO interview_questions
                    (id, session_id, question_text, category, suggested_duration_seconds, order_index)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {QUESTION_COLUMNS}
                "#
            ))
            .bind(Uuid::new_v4())
            .bind(session.id)
            .bind(q.text)
            .bind(q.category)
            .bind(q.suggested_duration_seconds)
            .bind(idx as i32)
            .fetch_one(&mut *tx)
            .await?;
            questions.push(question);
        }

        let next = session.status().transition(SessionStatus::InProgress)?;
        let session = set_status(&mut tx, session.id, next).await?;
        tx.commit().await?;

        tracing::info!(session_id = %session.id, %user_id, questions = questions.len(), "interview session started");
        Ok(SessionResponse::assemble(session, questions, vec![]))
    }

    pub async fn get_session(&self, user_id: Uuid, session_id: Uuid) -> Result<SessionResponse> {
        let session = self.session_for_user(session_id, user_id).await?;

        let questions = sqlx::query_as::<_, InterviewQuestion>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM interview_questions WHERE session_id = $1 ORDER BY order_index"
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let feedback = sqlx::query_as::<_, QuestionFeedback>(&format!(
            r#"
            SELECT {cols} FROM question_feedback f
            WHERE f.question_id IN (SELECT id FROM interview_questions WHERE session_id = $1)
            "#,
            cols = prefixed(FEEDBACK_COLUMNS, "f")
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(SessionResponse::assemble(session, questions, feedback))
    }

    pub async fn submit_answer(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        question_id: Uuid,
        payload: SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse> {
        let session = self.session_for_user(session_id, user_id).await?;
        let restore_to = match session.status() {
            SessionStatus::Completed => return Err(already_completed()),
            SessionStatus::Submitting if !self.is_stale(&session) => return Err(busy()),
            // the request that claimed it is gone; take over from where it started
            SessionStatus::Submitting => self.resting_status(session_id).await?,
            status if status.accepts_answers() => status,
            status => {
                return Err(Error::Conflict(format!(
                    "This interview session is not ready for answers ({}).",
                    status
                )))
            }
        };

        let question = sqlx::query_as::<_, InterviewQuestion>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM interview_questions WHERE id = $1 AND session_id = $2"
        ))
        .bind(question_id)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Question not found.".into()))?;

        if question.is_answered() {
            return Err(Error::BadRequest(
                "This question has already been answered.".into(),
            ));
        }

        restore_to.transition(SessionStatus::Submitting)?;
        self.claim(session_id, restore_to).await?;

        // scoring runs detached so a dropped request still records or releases
        let scoring = {
            let this = self.clone();
            let session = session.clone();
            let answer = payload.answer.trim().to_string();
            tokio::spawn(async move {
                this.score_and_record(session, question, answer, restore_to)
                    .await
            })
        };
        let recorded = scoring
            .await
            .map_err(|e| Error::Internal(format!("scoring task failed: {}", e)))??;

        tracing::info!(
            %session_id,
            %question_id,
            score = recorded.feedback.score,
            complete = recorded.session_complete,
            "answer scored"
        );

        Ok(SubmitAnswerResponse {
            question_id,
            feedback: FeedbackResponse::from(recorded.feedback),
            is_last_question: recorded.session_complete,
            session_complete: recorded.session_complete,
            answered_count: recorded.answered_count,
            total_questions: session.question_count,
        })
    }

    async fn score_and_record(
        &self,
        session: InterviewSession,
        question: InterviewQuestion,
        answer: String,
        restore_to: SessionStatus,
    ) -> Result<RecordedAnswer> {
        let difficulty: Difficulty = session.difficulty.parse().unwrap_or(Difficulty::Intermediate);
        let outcome = match self
            .ai
            .evaluate_answer(&question.question_text, &answer, &session.role, difficulty)
            .await
        {
            Ok(evaluation) => self.record(&session, question.id, &answer, evaluation).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &outcome {
            tracing::warn!(session_id = %session.id, question_id = %question.id, error = %e, "answer scoring failed, restoring session");
            self.release(session.id, restore_to).await;
        }
        outcome
    }

    /// A `submitting` row older than this was left behind by a request that
    /// never finished.
    fn is_stale(&self, session: &InterviewSession) -> bool {
        Utc::now() - session.updated_at > self.stale_claim_after
    }

    /// The status a session had before its abandoned claim.
    async fn resting_status(&self, session_id: Uuid) -> Result<SessionStatus> {
        let answered = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM interview_questions WHERE session_id = $1 AND user_answer IS NOT NULL",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(if answered > 0 {
            SessionStatus::Feedback
        } else {
            SessionStatus::InProgress
        })
    }

    /// Moves the session into `submitting` only if nobody else holds a live
    /// claim on it.
    async fn claim(&self, session_id: Uuid, from: SessionStatus) -> Result<()> {
        let claimed = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE interview_sessions SET status = $1, updated_at = NOW()
            WHERE id = $2
              AND (status = $3
                   OR (status = $1 AND updated_at < NOW() - make_interval(secs => $4)))
            RETURNING id
            "#,
        )
        .bind(SessionStatus::Submitting.as_str())
        .bind(session_id)
        .bind(from.as_str())
        .bind(self.stale_claim_after.num_seconds() as f64)
        .fetch_optional(&self.pool)
        .await?;

        if claimed.is_some() {
            return Ok(());
        }

        // lost the race; report what the winner left behind
        let current = sqlx::query_scalar::<_, String>(
            "SELECT status FROM interview_sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Err(lost_claim(current.and_then(|s| s.parse().ok())))
    }

    async fn release(&self, session_id: Uuid, restore_to: SessionStatus) {
        let result = sqlx::query(
            r#"
            UPDATE interview_sessions SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = $3
            "#,
        )
        .bind(restore_to.as_str())
        .bind(session_id)
        .bind(SessionStatus::Submitting.as_str())
        .execute(&self.pool)
        .await;
        if let Err(e) = result {
            tracing::error!(%session_id, error = ?e, "failed to restore session status");
        }
    }

    async fn record(
        &self,
        session: &InterviewSession,
        question_id: Uuid,
        answer: &str,
        evaluation: AnswerEvaluation,
    ) -> Result<RecordedAnswer> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE interview_questions SET user_answer = $1, updated_at = NOW()
            WHERE id = $2 AND user_answer IS NULL
            "#,
        )
        .bind(answer)
        .bind(question_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(Error::BadRequest(
                "This question has already been answered.".into(),
            ));
        }

        let feedback = sqlx::query_as::<_, QuestionFeedback>(&format!(
            r#"
            INSERT INTO question_feedback (id, question_id, score, overall_feedback, strengths, improvements)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {FEEDBACK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(question_id)
        .bind(evaluation.score)
        .bind(&evaluation.overall_feedback)
        .bind(sqlx::types::Json(&evaluation.strengths))
        .bind(sqlx::types::Json(&evaluation.improvements))
        .fetch_one(&mut *tx)
        .await?;

        let scores = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT f.score FROM question_feedback f
            JOIN interview_questions q ON q.id = f.question_id
            WHERE q.session_id = $1
            "#,
        )
        .bind(session.id)
        .fetch_all(&mut *tx)
        .await?;

        let answered_count = scores.len() as i64;
        let session_complete = answered_count >= session.question_count as i64;

        if session_complete {
            let next = SessionStatus::Submitting.transition(SessionStatus::Completed)?;
            sqlx::query(
                r#"
                UPDATE interview_sessions
                SET status = $1, final_score = $2, completed_at = NOW(), updated_at = NOW()
                WHERE id = $3
                "#,
            )
            .bind(next.as_str())
            .bind(mean_score(&scores))
            .bind(session.id)
            .execute(&mut *tx)
            .await?;
        } else {
            let next = SessionStatus::Submitting.transition(SessionStatus::Feedback)?;
            set_status(&mut tx, session.id, next).await?;
        }

        tx.commit().await?;
        Ok(RecordedAnswer {
            feedback,
            answered_count,
            session_complete,
        })
    }

    /// Sessions of other users are reported as missing.
    async fn session_for_user(&self, session_id: Uuid, user_id: Uuid) -> Result<InterviewSession> {
        sqlx::query_as::<_, InterviewSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM interview_sessions WHERE id = $1 AND user_id = $2"
        ))
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Session not found.".into()))
    }
}

async fn set_status(
    tx: &mut Transaction<'_, Postgres>,
    session_id: Uuid,
    status: SessionStatus,
) -> Result<InterviewSession> {
    let session = sqlx::query_as::<_, InterviewSession>(&format!(
        r#"
        UPDATE interview_sessions SET status = $1, updated_at = NOW()
        WHERE id = $2
        RETURNING {SESSION_COLUMNS}
        "#
    ))
    .bind(status.as_str())
    .bind(session_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(session)
}

fn already_completed() -> Error {
    Error::BadRequest("This interview session is already completed.".into())
}

fn busy() -> Error {
    Error::Conflict("An answer for this session is already being evaluated.".into())
}

/// The error for a claim that found the session no longer in the expected
/// state.
fn lost_claim(current: Option<SessionStatus>) -> Error {
    match current {
        Some(SessionStatus::Completed) => already_completed(),
        None => Error::NotFound("Session not found.".into()),
        Some(_) => busy(),
    }
}

fn prefixed(columns: &str, alias: &str) -> String {
    columns
        .split(',')
        .map(|c| format!("{}.{}", alias, c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
