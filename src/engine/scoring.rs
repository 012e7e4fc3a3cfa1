// src/engine/scoring.rs

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{question::Question, submission::AnsweredPair};

/// Counts the correct answers for an attempt.
///
/// * One point per question whose recorded option id equals the correct one.
/// * Unanswered questions score zero; no penalty.
/// * Answers for question ids not in `questions` are ignored.
/// * `answers` carries no ordering guarantee; a later duplicate for the same
///   question id overwrites an earlier one, matching the session's
///   re-answer rule.
///
/// Pure and deterministic: `0 <= score <= questions.len()`.
pub fn score(questions: &[Question], answers: &[AnsweredPair]) -> u32 {
    let chosen: HashMap<Uuid, &str> = answers
        .iter()
        .map(|a| (a.question_id, a.option_id.as_str()))
        .collect();

    questions
        .iter()
        .filter(|q| chosen.get(&q.id).is_some_and(|&opt| opt == q.correct_option_id))
        .count() as u32
}
