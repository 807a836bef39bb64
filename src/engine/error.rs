// src/engine/error.rs

use thiserror::Error;

use crate::repository::RepositoryError;

/// Why a submission was not turned into an attempt.
///
/// All variants except `PersistenceFailure` are local validation outcomes.
/// None of them is retried by the engine.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("QuizId mismatch: requested {requested}, submitted {submitted}")]
    QuizIdMismatch { requested: i64, submitted: i64 },

    #[error("Quiz {0} not found")]
    QuizNotFound(i64),

    #[error("Quiz is not published")]
    QuizNotPublished,

    #[error("Quiz has no questions")]
    QuizHasNoQuestions,

    /// The submission does not answer every question exactly once.
    #[error("All questions must be answered: expected {expected} answers, received {received}")]
    IncompleteSubmission { expected: usize, received: usize },

    /// A question id is not part of the quiz, or the option does not belong to that question.
    #[error("Invalid answer option {answer_option_id} for question {question_id}")]
    InvalidAnswerReference {
        question_id: i64,
        answer_option_id: i64,
    },

    #[error("Maximum number of attempts reached ({max_attempts})")]
    MaxAttemptsReached { max_attempts: i32 },

    #[error("failed to persist attempt: {0}")]
    PersistenceFailure(#[from] RepositoryError),
}

impl SubmissionError {
    /// Stable reason code exposed to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            SubmissionError::QuizIdMismatch { .. } => "quiz_id_mismatch",
            SubmissionError::QuizNotFound(_) => "quiz_not_found",
            SubmissionError::QuizNotPublished => "quiz_not_published",
            SubmissionError::QuizHasNoQuestions => "quiz_has_no_questions",
            SubmissionError::IncompleteSubmission { .. } => "incomplete_submission",
            SubmissionError::InvalidAnswerReference { .. } => "invalid_answer_reference",
            SubmissionError::MaxAttemptsReached { .. } => "max_attempts_reached",
            SubmissionError::PersistenceFailure(_) => "persistence_failure",
        }
    }
}
