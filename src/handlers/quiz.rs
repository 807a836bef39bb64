// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::{CreateQuestionRequest, PublicQuiz, QuizOverview, QuizRequest},
    state::AppState,
    utils::html::{clean_question_request, clean_quiz_request},
};

fn quiz_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Quiz {} not found", id))
}

/// Lists all quizzes with their questions.
/// Correctness flags are never exposed.
pub async fn list_quizzes(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let quizzes: Vec<PublicQuiz> = state
        .quizzes
        .list_quizzes()
        .await?
        .into_iter()
        .map(PublicQuiz::from)
        .collect();

    Ok(Json(quizzes))
}

/// Lists published quizzes as overview rows (no questions).
pub async fn list_published(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let quizzes: Vec<QuizOverview> = state
        .quizzes
        .list_quizzes()
        .await?
        .iter()
        .filter(|q| q.is_published)
        .map(QuizOverview::from)
        .collect();

    Ok(Json(quizzes))
}

pub async fn get_quiz(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = state
        .quizzes
        .find_quiz(id)
        .await?
        .ok_or_else(|| quiz_not_found(id))?;

    Ok(Json(PublicQuiz::from(quiz)))
}

/// Creates a new quiz (without questions).
/// Admin only.
pub async fn create_quiz(
    State(state): State<AppState>,
    Json(payload): Json<QuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let quiz = state
        .quizzes
        .create_quiz(&clean_quiz_request(&payload))
        .await
        .map_err(|e| {
            tracing::error!("Failed to create quiz: {:?}", e);
            AppError::from(e)
        })?;

    tracing::info!("Created quiz {} '{}'", quiz.id, quiz.title);
    Ok((StatusCode::CREATED, Json(PublicQuiz::from(quiz))))
}

/// Replaces a quiz's settings.
/// Admin only.
pub async fn update_quiz(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<QuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if !state.quizzes.update_quiz(id, &clean_quiz_request(&payload)).await? {
        return Err(quiz_not_found(id));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Deletes a quiz with its questions and attempts.
/// Admin only.
pub async fn delete_quiz(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !state.quizzes.delete_quiz(id).await? {
        return Err(quiz_not_found(id));
    }

    tracing::info!("Deleted quiz {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Admin only.
pub async fn publish_quiz(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_published(&state, id, true).await
}

/// Admin only.
pub async fn unpublish_quiz(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_published(&state, id, false).await
}

async fn set_published(state: &AppState, id: i64, published: bool) -> Result<StatusCode, AppError> {
    if !state.quizzes.set_published(id, published).await? {
        return Err(quiz_not_found(id));
    }

    tracing::info!("Quiz {} published = {}", id, published);
    Ok(StatusCode::NO_CONTENT)
}

/// Adds a question with its answer options to a quiz.
/// Admin only.
pub async fn add_question(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if !payload.answer_options.iter().any(|a| a.is_correct) {
        tracing::warn!("Question added to quiz {} has no correct option", quiz_id);
    }

    let question = state
        .quizzes
        .add_question(quiz_id, &clean_question_request(&payload))
        .await?
        .ok_or_else(|| quiz_not_found(quiz_id))?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Admin only.
pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !state.quizzes.delete_question(id).await? {
        return Err(AppError::NotFound(format!("Question {} not found", id)));
    }

    Ok(StatusCode::NO_CONTENT)
}
