use uuid::Uuid;

use super::api::MockMateClient;
use super::error::{ClientError, ClientResult};
use crate::dto::interview_dto::{
    QuestionResponse, SessionResponse, StartInterviewRequest, SubmitAnswerResponse,
};
use crate::models::score::{mean_score, round1};
use crate::models::session::SessionStatus;

/// Walks a single interview session question by question.
///
/// The runner mirrors the server's state machine locally: `submit` moves
/// `in_progress -> submitting -> feedback` and `advance` leaves feedback for
/// the next question or for `completed`. A failed submission returns the
/// runner to `in_progress` so the same question can be retried.
pub struct InterviewRunner<'c> {
    client: &'c MockMateClient,
    session: SessionResponse,
    status: SessionStatus,
    current: usize,
    last_result: Option<SubmitAnswerResponse>,
}

impl<'c> InterviewRunner<'c> {
    pub async fn start(
        client: &'c MockMateClient,
        request: &StartInterviewRequest,
    ) -> ClientResult<Self> {
        let session = client.start_interview(request).await?;
        let status = SessionStatus::Started.transition(SessionStatus::InProgress)?;
        Ok(Self::from_session(client, session, status))
    }

    /// Picks up a session created earlier, at its first unanswered question.
    pub async fn resume(client: &'c MockMateClient, session_id: Uuid) -> ClientResult<Self> {
        let session = client.get_session(session_id).await?;
        let status = if session.status.is_terminal() || session.next_unanswered().is_none() {
            SessionStatus::Completed
        } else {
            SessionStatus::InProgress
        };
        Ok(Self::from_session(client, session, status))
    }

    fn from_session(
        client: &'c MockMateClient,
        session: SessionResponse,
        status: SessionStatus,
    ) -> Self {
        let current = first_unanswered(&session);
        Self {
            client,
            session,
            status,
            current,
            last_result: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn session(&self) -> &SessionResponse {
        &self.session
    }

    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// The question being answered, or the one whose feedback is shown.
    pub fn current_question(&self) -> Option<&QuestionResponse> {
        if self.is_complete() {
            return None;
        }
        self.session.questions.get(self.current)
    }

    /// 1-based position of the current question and the total.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.session.questions.len();
        ((self.current + 1).min(total), total)
    }

    pub fn last_result(&self) -> Option<&SubmitAnswerResponse> {
        self.last_result.as_ref()
    }

    pub async fn submit(&mut self, answer: &str) -> ClientResult<&SubmitAnswerResponse> {
        if self.status != SessionStatus::InProgress {
            return Err(ClientError::Validation(format!(
                "cannot submit while {}",
                self.status
            )));
        }
        let question_id = self
            .current_question()
            .map(|q| q.id)
            .ok_or_else(|| ClientError::Validation("no question left to answer".into()))?;
        let before = self.status;
        self.status = before.transition(SessionStatus::Submitting)?;

        let result = match self
            .client
            .submit_answer(self.session.id, question_id, answer)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                self.status = before;
                return Err(e);
            }
        };

        if let Some(question) = self.session.questions.get_mut(self.current) {
            question.user_answer = Some(answer.trim().to_string());
            question.feedback = Some(result.feedback.clone());
        }
        self.status = self.status.transition(SessionStatus::Feedback)?;
        Ok(self.last_result.insert(result))
    }

    /// Leaves the feedback view. Returns the new status.
    pub fn advance(&mut self) -> ClientResult<SessionStatus> {
        if self.status != SessionStatus::Feedback {
            return Err(ClientError::Validation(format!(
                "cannot advance while {}",
                self.status
            )));
        }

        let server_done = self
            .last_result
            .as_ref()
            .map(|r| r.session_complete)
            .unwrap_or(false);
        let next = first_unanswered(&self.session);

        if server_done || next >= self.session.questions.len() {
            self.status = self.status.transition(SessionStatus::Completed)?;
            self.session.status = SessionStatus::Completed;
            self.session.final_score = self.average_score();
        } else {
            self.status = self.status.transition(SessionStatus::InProgress)?;
            self.current = next;
        }
        Ok(self.status)
    }

    /// Mean of the scores received so far, one decimal.
    pub fn average_score(&self) -> Option<f64> {
        let scores: Vec<i32> = self
            .session
            .questions
            .iter()
            .filter_map(|q| q.feedback.as_ref().map(|f| f.score))
            .collect();
        mean_score(&scores).map(round1)
    }
}

fn first_unanswered(session: &SessionResponse) -> usize {
    session
        .questions
        .iter()
        .position(|q| q.user_answer.is_none())
        .unwrap_or(session.questions.len())
}
