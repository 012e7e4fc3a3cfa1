// src/models/submission.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded choice: which option the participant picked for a question.
/// At most one per question id per attempt; re-answering overwrites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsweredPair {
    pub question_id: Uuid,
    pub option_id: String,
}

/// The single final result of one attempt.
///
/// Invariants: `score <= total_questions`; produced exactly once per
/// (quiz, participant) pair by the session's finalize operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub participant_id: String,
    pub answers: Vec<AnsweredPair>,
    pub score: u32,
    pub total_questions: u32,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

impl SubmissionRecord {
    /// Score as a percentage of the question count, e.g. 100.0 for 2/2.
    pub fn percent(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        f64::from(self.score) * 100.0 / f64::from(self.total_questions)
    }
}

/// Aggregated row for displaying the leaderboard of a quiz.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub participant_id: String,
    pub score: u32,
    pub total_questions: u32,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}
