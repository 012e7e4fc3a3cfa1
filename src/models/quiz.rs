// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of a daily quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizStatus {
    Draft,
    Published,
}

/// A daily quiz assembled by the operator.
///
/// `published_at` is stamped exactly once, at the Draft -> Published
/// transition. A quiz delivered to a session is always Published and
/// carries a publish timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub title: String,
    pub duration_minutes: u32,
    pub question_ids: Vec<Uuid>,
    pub status: QuizStatus,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Quiz {
    pub fn duration_secs(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }
}

/// DTO for the operator creating a new draft quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(range(min = 1, max = 240))]
    pub duration_minutes: u32,
    #[validate(length(min = 1))]
    pub question_ids: Vec<Uuid>,
}
