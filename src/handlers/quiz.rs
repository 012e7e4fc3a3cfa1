// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{Json, extract::{Path, State}, response::IntoResponse};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    store::{MemoryStore, QuizSource},
};

/// Returns the currently published quiz, if any.
///
/// Participant-facing: exposes identity, duration and the publish anchor
/// (clients recompute remaining time from it), never the question ids.
pub async fn get_active_quiz(
    State(store): State<Arc<MemoryStore>>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = store
        .active_quiz()
        .await?
        .ok_or_else(|| AppError::NotFound("No quiz is currently published".to_string()))?;

    Ok(Json(json!({
        "id": quiz.id,
        "title": quiz.title,
        "duration_minutes": quiz.duration_minutes,
        "published_at": quiz.published_at,
        "question_count": quiz.question_ids.len(),
    })))
}

/// Retrieves the top 5 results for a quiz.
pub async fn get_leaderboard(
    State(store): State<Arc<MemoryStore>>,
    Path(quiz_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    store
        .get_quiz(quiz_id)
        .await
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    let leaderboard = store.leaderboard(quiz_id, 5).await;
    Ok(Json(leaderboard))
}
