use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::dto::dashboard_dto::{AnalyticsResponse, SessionHistoryItem};
use crate::error::Result;
use crate::models::score::{round1, ScoreBand};
use crate::models::session::SessionStatus;
use crate::utils::time::{day_start, today, trailing_days};

pub const TREND_DAYS: u32 = 7;

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: Uuid,
    role: String,
    difficulty: String,
    question_count: i32,
    final_score: Option<f64>,
    completed_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct Totals {
    total: i64,
    average: Option<f64>,
    best: Option<f64>,
}

#[derive(Debug, FromRow)]
struct DailyAverage {
    day: NaiveDate,
    average: Option<f64>,
}

#[derive(Clone)]
pub struct AnalyticsService {
    pool: PgPool,
}

impl AnalyticsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Most recent completed sessions, newest first.
    pub async fn history(&self, user_id: Uuid, limit: i64) -> Result<Vec<SessionHistoryItem>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, role, difficulty, question_count, final_score, completed_at
            FROM interview_sessions
            WHERE user_id = $1 AND status = $2 AND completed_at IS NOT NULL
            ORDER BY completed_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(SessionStatus::Completed.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let score = r.final_score.unwrap_or(0.0);
                SessionHistoryItem {
                    id: r.id,
                    role: r.role,
                    difficulty: r.difficulty,
                    question_count: r.question_count,
                    score,
                    band: ScoreBand::from_score(score),
                    completed_at: r.completed_at,
                }
            })
            .collect())
    }

    pub async fn analytics(&self, user_id: Uuid) -> Result<AnalyticsResponse> {
        let totals = sqlx::query_as::<_, Totals>(
            r#"
            SELECT COUNT(*) AS total, AVG(final_score) AS average, MAX(final_score) AS best
            FROM interview_sessions
            WHERE user_id = $1 AND status = $2 AND final_score IS NOT NULL
            "#,
        )
        .bind(user_id)
        .bind(SessionStatus::Completed.as_str())
        .fetch_one(&self.pool)
        .await?;

        if totals.total == 0 {
            return Ok(empty_analytics());
        }

        let today = today();
        let since = day_start(today - Duration::days(TREND_DAYS as i64 - 1));
        let daily = sqlx::query_as::<_, DailyAverage>(
            r#"
            SELECT (completed_at AT TIME ZONE 'UTC')::date AS day, AVG(final_score) AS average
            FROM interview_sessions
            WHERE user_id = $1 AND status = $2 AND final_score IS NOT NULL
              AND completed_at >= $3
            GROUP BY day
            "#,
        )
        .bind(user_id)
        .bind(SessionStatus::Completed.as_str())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let daily: Vec<(NaiveDate, f64)> = daily
            .into_iter()
            .filter_map(|d| d.average.map(|avg| (d.day, avg)))
            .collect();

        Ok(AnalyticsResponse {
            total_sessions: totals.total,
            average_score: round1(totals.average.unwrap_or(0.0)),
            best_score: round1(totals.best.unwrap_or(0.0)),
            weekly_scores: weekly_series(&daily, today),
        })
    }
}

pub fn empty_analytics() -> AnalyticsResponse {
    AnalyticsResponse {
        total_sessions: 0,
        average_score: 0.0,
        best_score: 0.0,
        weekly_scores: vec![0.0; TREND_DAYS as usize],
    }
}

/// One value per trailing day ending `today`; days without sessions are 0.
pub fn weekly_series(daily: &[(NaiveDate, f64)], today: NaiveDate) -> Vec<f64> {
    trailing_days(today, TREND_DAYS)
        .into_iter()
        .map(|day| {
            daily
                .iter()
                .find(|(d, _)| *d == day)
                .map(|(_, avg)| round1(*avg))
                .unwrap_or(0.0)
        })
        .collect()
}
