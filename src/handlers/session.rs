// src/handlers/session.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    engine::session::SelectOutcome,
    error::AppError,
    state::AppState,
};

/// DTO for a participant entering the quiz view.
#[derive(Debug, Deserialize, Validate)]
pub struct JoinRequest {
    #[validate(length(min = 1, max = 64, message = "participant_id length must be between 1 and 64 characters."))]
    pub participant_id: String,
}

/// DTO for answering the current question.
#[derive(Debug, Deserialize, Validate)]
pub struct AnswerRequest {
    #[validate(length(min = 1, max = 50))]
    pub option_id: String,
}

/// Creates a session for the participant (idempotent: joining twice
/// returns the existing session).
///
/// * Bumps the online count on first join.
/// * If a quiz is already published, the session starts against the shared
///   deadline immediately.
pub async fn join(
    State(state): State<AppState>,
    Json(payload): Json<JoinRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let (handle, created) = state.registry.join(&payload.participant_id).await;
    let snapshot = handle
        .snapshot()
        .await
        .ok_or_else(|| AppError::InternalServerError("session task unavailable".to_string()))?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((
        status,
        Json(json!({
            "participant_id": payload.participant_id,
            "online": state.bridge.online(),
            "session": snapshot,
        })),
    ))
}

/// Read-only projection of the session for the presentation layer.
pub async fn get_session(
    State(state): State<AppState>,
    Path(participant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state
        .registry
        .get(&participant_id)
        .await
        .ok_or_else(|| AppError::NotFound("No session for this participant".to_string()))?;

    let snapshot = handle
        .snapshot()
        .await
        .ok_or_else(|| AppError::InternalServerError("session task unavailable".to_string()))?;

    Ok(Json(json!({
        "online": state.bridge.online(),
        "session": snapshot,
    })))
}

/// Records the participant's choice for the current question.
///
/// * While feedback is showing or after submission the choice is silently
///   dropped and the current projection is returned (no error).
/// * Before any quiz is loaded the action is rejected with 503.
pub async fn answer(
    State(state): State<AppState>,
    Path(participant_id): Path<String>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let handle = state
        .registry
        .get(&participant_id)
        .await
        .ok_or_else(|| AppError::NotFound("No session for this participant".to_string()))?;

    let outcome = handle
        .select_option(&payload.option_id)
        .await
        .ok_or_else(|| AppError::InternalServerError("session task unavailable".to_string()))?;

    let feedback = match outcome {
        SelectOutcome::Recorded(feedback) => Some(feedback),
        SelectOutcome::Ignored => None,
        SelectOutcome::NotReady => {
            return Err(AppError::NotReady("The quiz is not loaded yet".to_string()));
        }
        SelectOutcome::UnknownOption => {
            return Err(AppError::BadRequest(
                "Option does not belong to the current question".to_string(),
            ));
        }
    };

    let snapshot = handle
        .snapshot()
        .await
        .ok_or_else(|| AppError::InternalServerError("session task unavailable".to_string()))?;

    Ok(Json(json!({
        "feedback": feedback,
        "session": snapshot,
    })))
}

/// Tears the session down and decrements the online count.
pub async fn leave(
    State(state): State<AppState>,
    Path(participant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.registry.leave(&participant_id).await {
        return Err(AppError::NotFound("No session for this participant".to_string()));
    }
    Ok(Json(json!({ "message": "Session closed" })))
}
