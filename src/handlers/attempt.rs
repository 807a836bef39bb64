// src/handlers/attempt.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::attempt::Submission,
    state::AppState,
    utils::jwt::Claims,
};

/// Submits answers for a quiz and records a scored attempt.
///
/// The user id comes from the verified token; the engine does the rest.
pub async fn submit_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(submission): Json<Submission>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let outcome = state.submissions.submit(quiz_id, &submission, user_id).await?;
    Ok(Json(outcome))
}

/// The caller's own attempts on a quiz.
pub async fn my_attempts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let attempts = state.submissions.attempts_for_user(quiz_id, user_id).await?;
    Ok(Json(attempts))
}

/// All attempts on a quiz.
/// Admin only.
pub async fn quiz_attempts(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = state.submissions.attempts_for_quiz(quiz_id).await?;
    Ok(Json(attempts))
}

/// One attempt with its recorded answers.
/// Visible to its owner and to admins; anyone else gets 404.
pub async fn get_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let not_found = || AppError::NotFound(format!("Attempt {} not found", attempt_id));

    let attempt = state
        .submissions
        .attempt(attempt_id)
        .await?
        .ok_or_else(not_found)?;

    if attempt.user_id != user_id && !claims.is_admin() {
        return Err(not_found());
    }

    Ok(Json(attempt))
}
