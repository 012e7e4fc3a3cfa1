// src/models/question.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A single answer option within a question.
/// The `id` is unique within its question (e.g. "a", "b", "c").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
}

/// A multiple-choice question in the bank.
/// Immutable once handed to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,

    /// The text content of the question.
    pub prompt: String,

    /// Ordered list of answer options.
    pub options: Vec<QuestionOption>,

    /// Option id of the correct choice. Never sent to participants.
    pub correct_option_id: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Question {
    /// Participant-facing view with the answer key stripped.
    pub fn public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id,
            prompt: self.prompt.clone(),
            options: self.options.clone(),
        }
    }
}

/// DTO for sending a question to participants (excludes the correct option).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub prompt: String,
    pub options: Vec<QuestionOption>,
}

/// DTO for the operator creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub prompt: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<QuestionOption>,
    #[validate(length(min = 1, max = 50))]
    pub correct_option_id: String,
}

fn validate_options(options: &[QuestionOption]) -> Result<(), validator::ValidationError> {
    if options.len() < 2 {
        return Err(validator::ValidationError::new("need_at_least_two_options"));
    }
    for opt in options {
        if opt.id.is_empty() || opt.id.len() > 50 {
            return Err(validator::ValidationError::new("bad_option_id"));
        }
        if opt.text.is_empty() || opt.text.len() > 500 {
            return Err(validator::ValidationError::new("bad_option_text"));
        }
    }
    let mut ids: Vec<&str> = options.iter().map(|o| o.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.len() != options.len() {
        return Err(validator::ValidationError::new("duplicate_option_ids"));
    }
    Ok(())
}
