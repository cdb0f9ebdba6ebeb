use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct InterviewSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub difficulty: String,
    pub question_count: i32,
    pub final_score: Option<f64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl InterviewSession {
    /// Unknown stored values are treated as in progress so the session
    /// stays answerable.
    pub fn status(&self) -> SessionStatus {
        self.status.parse().unwrap_or(SessionStatus::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Difficulty {
    Easy,
    Intermediate,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Hard => "Hard",
        }
    }

    /// Time budget suggested for a question when the model gives none.
    pub fn default_duration_seconds(&self) -> i32 {
        match self {
            Difficulty::Easy => 120,
            Difficulty::Intermediate => 180,
            Difficulty::Hard => 240,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Easy" => Ok(Difficulty::Easy),
            "Intermediate" => Ok(Difficulty::Intermediate),
            "Hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {}", other)),
        }
    }
}

/// Lifecycle of one interview session.
///
/// The walk is linear: `Started -> InProgress -> Submitting -> Feedback`,
/// looping back through `Submitting` for every answer until the last one
/// lands in `Completed`. `Submitting -> InProgress` is the scoring-failed
/// path, and `Feedback -> InProgress` is the client advancing to the next
/// question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Started,
    InProgress,
    Submitting,
    Feedback,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid session transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: SessionStatus,
    pub to: SessionStatus,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Started => "started",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Submitting => "submitting",
            SessionStatus::Feedback => "feedback",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Started, InProgress)
                | (InProgress, Submitting)
                | (Submitting, Feedback)
                | (Submitting, Completed)
                | (Submitting, InProgress)
                | (Feedback, Submitting)
                | (Feedback, InProgress)
                | (Feedback, Completed)
        )
    }

    pub fn transition(self, next: SessionStatus) -> Result<SessionStatus, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition { from: self, to: next })
        }
    }

    /// Whether a new answer may be submitted from this state.
    pub fn accepts_answers(self) -> bool {
        self.can_transition_to(SessionStatus::Submitting)
    }

    pub fn is_terminal(self) -> bool {
        self == SessionStatus::Completed
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "started" => Ok(SessionStatus::Started),
            "in_progress" => Ok(SessionStatus::InProgress),
            "submitting" => Ok(SessionStatus::Submitting),
            "feedback" => Ok(SessionStatus::Feedback),
            "completed" => Ok(SessionStatus::Completed),
            other => Err(format!("unknown session status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionStatus::*;

    const ALL: [SessionStatus; 5] = [Started, InProgress, Submitting, Feedback, Completed];

    #[test]
    fn happy_path_walks_all_states() {
        let state = Started
            .transition(InProgress)
            .and_then(|s| s.transition(Submitting))
            .and_then(|s| s.transition(Feedback))
            .and_then(|s| s.transition(InProgress))
            .and_then(|s| s.transition(Submitting))
            .and_then(|s| s.transition(Feedback))
            .and_then(|s| s.transition(Completed))
            .unwrap();
        assert!(state.is_terminal());
    }

    #[test]
    fn completed_is_terminal() {
        for next in ALL {
            assert!(!Completed.can_transition_to(next));
        }
    }

    #[test]
    fn cannot_skip_scoring() {
        assert_eq!(
            InProgress.transition(Feedback),
            Err(InvalidTransition { from: InProgress, to: Feedback })
        );
        assert!(!Started.can_transition_to(Submitting));
        assert!(!InProgress.can_transition_to(Completed));
    }

    #[test]
    fn only_idle_states_accept_answers() {
        let accepting: Vec<_> = ALL.into_iter().filter(|s| s.accepts_answers()).collect();
        assert_eq!(accepting, vec![InProgress, Feedback]);
    }

    #[test]
    fn status_text_round_trips() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<SessionStatus>(), Ok(status));
        }
        assert_eq!(
            serde_json::to_string(&InProgress).unwrap(),
            "\"in_progress\""
        );
        assert!("paused".parse::<SessionStatus>().is_err());
    }

    #[test]
    fn difficulty_uses_title_case_on_the_wire() {
        let d: Difficulty = serde_json::from_str("\"Intermediate\"").unwrap();
        assert_eq!(d, Difficulty::Intermediate);
        assert!(serde_json::from_str::<Difficulty>("\"easy\"").is_err());
        assert_eq!(Difficulty::Hard.default_duration_seconds(), 240);
    }
}
