// src/handlers/admin.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    engine::bridge::EventBridge,
    error::AppError,
    models::{question::CreateQuestionRequest, quiz::CreateQuizRequest},
    store::MemoryStore,
};

/// Adds a question to the bank.
/// Operator only.
pub async fn create_question(
    State(store): State<Arc<MemoryStore>>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let question = store.add_question(payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": question.id }))))
}

/// Lists the full bank, answer keys included.
/// Operator only.
pub async fn list_questions(
    State(store): State<Arc<MemoryStore>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.list_questions().await))
}

/// Creates a new draft quiz over existing bank questions.
/// Operator only.
pub async fn create_quiz(
    State(store): State<Arc<MemoryStore>>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let quiz = store
        .create_quiz(payload.title, payload.duration_minutes, payload.question_ids)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": quiz.id }))))
}

/// Publishes a draft quiz.
///
/// * Stamps the publish anchor exactly once (second call is a 409).
/// * Notifies every live session through the event bridge; sessions already
///   attempting this quiz id ignore the re-delivery.
pub async fn publish_quiz(
    State(store): State<Arc<MemoryStore>>,
    State(bridge): State<Arc<EventBridge>>,
    Path(quiz_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = store.publish_quiz(quiz_id).await?;
    bridge.publish_quiz(quiz.id);
    tracing::info!("quiz {} ({}) published", quiz.id, quiz.title);

    Ok(Json(quiz))
}

/// Lists the stored submissions for a quiz.
/// Operator only.
pub async fn list_submissions(
    State(store): State<Arc<MemoryStore>>,
    Path(quiz_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    store
        .get_quiz(quiz_id)
        .await
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    Ok(Json(store.submissions_for(quiz_id).await))
}
