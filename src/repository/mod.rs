// src/repository/mod.rs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    attempt::{Attempt, AttemptRow, NewAttempt},
    quiz::{CreateQuestionRequest, Question, Quiz, QuizRequest},
    user::{NewUser, User},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A uniqueness rule was violated (e.g. duplicate e-mail).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The quiz catalog: quizzes with their questions and answer options.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Loads the full question/answer-option tree, or `None` if no such quiz.
    async fn find_quiz(&self, quiz_id: i64) -> Result<Option<Quiz>, RepositoryError>;

    /// All quizzes ordered by id, each with its tree.
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, RepositoryError>;

    async fn create_quiz(&self, req: &QuizRequest) -> Result<Quiz, RepositoryError>;

    /// Replaces quiz settings. Returns `false` if the quiz does not exist.
    async fn update_quiz(&self, quiz_id: i64, req: &QuizRequest) -> Result<bool, RepositoryError>;

    /// Deletes a quiz with its questions, options and attempts.
    async fn delete_quiz(&self, quiz_id: i64) -> Result<bool, RepositoryError>;

    async fn set_published(&self, quiz_id: i64, published: bool) -> Result<bool, RepositoryError>;

    /// Returns `None` if the quiz does not exist.
    async fn add_question(
        &self,
        quiz_id: i64,
        req: &CreateQuestionRequest,
    ) -> Result<Option<Question>, RepositoryError>;

    async fn delete_question(&self, question_id: i64) -> Result<bool, RepositoryError>;
}

/// The attempt ledger. Records are insert-only.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    async fn count_attempts(&self, quiz_id: i64, user_id: i64) -> Result<i64, RepositoryError>;

    /// Atomically counts the (quiz, user) attempts and inserts `attempt` only if
    /// the count is below `limit`. Returns the new id, or `None` when the limit
    /// was already reached.
    async fn insert_if_under_limit(
        &self,
        attempt: &NewAttempt,
        limit: i64,
    ) -> Result<Option<i64>, RepositoryError>;

    /// Attempts of one user on one quiz, ordered by completion time then id.
    async fn list_for_user(&self, quiz_id: i64, user_id: i64) -> Result<Vec<AttemptRow>, RepositoryError>;

    /// All attempts on a quiz, ordered by completion time then id.
    async fn list_for_quiz(&self, quiz_id: i64) -> Result<Vec<AttemptRow>, RepositoryError>;

    /// One attempt with its answer records.
    async fn find_attempt(&self, attempt_id: i64) -> Result<Option<Attempt>, RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Fails with [`RepositoryError::Conflict`] when the e-mail is taken.
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError>;
}
