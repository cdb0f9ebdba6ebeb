use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Coarse rating of a 0-100 score, used for colouring results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Strong,
    Fair,
    Weak,
}

impl ScoreBand {
    pub const STRONG_THRESHOLD: f64 = 80.0;
    pub const FAIR_THRESHOLD: f64 = 60.0;

    pub fn from_score(score: f64) -> Self {
        if score >= Self::STRONG_THRESHOLD {
            ScoreBand::Strong
        } else if score >= Self::FAIR_THRESHOLD {
            ScoreBand::Fair
        } else {
            ScoreBand::Weak
        }
    }
}

/// Mean of the given per-question scores, `None` when empty.
pub fn mean_score(scores: &[i32]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let total: i64 = scores.iter().map(|&s| s as i64).sum();
    Some(total as f64 / scores.len() as f64)
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
