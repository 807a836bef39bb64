// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The transient answer payload a user sends when completing a quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Declared quiz id; must match the quiz addressed by the request.
    pub quiz_id: i64,

    pub answers: Vec<SubmittedAnswer>,

    /// When the user opened the quiz. Defaults to the completion time.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// One (question, chosen option) pair of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub selected_answer_option_id: i64,
}

/// An immutable record of a completed submission, as stored in 'quiz_attempts'.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub score_percentage: f64,
    pub is_passed: bool,
    pub answers: Vec<AttemptAnswer>,
}

/// Represents the 'quiz_attempt_answers' table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttemptAnswer {
    pub question_id: i64,
    pub selected_answer_option_id: i64,
}

impl From<SubmittedAnswer> for AttemptAnswer {
    fn from(answer: SubmittedAnswer) -> Self {
        Self {
            question_id: answer.question_id,
            selected_answer_option_id: answer.selected_answer_option_id,
        }
    }
}

/// An attempt that has been scored but not yet assigned an id by the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttempt {
    pub quiz_id: i64,
    pub user_id: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub score_percentage: f64,
    pub is_passed: bool,
    pub answers: Vec<AttemptAnswer>,
}

impl NewAttempt {
    pub fn into_attempt(self, id: i64) -> Attempt {
        Attempt {
            id,
            quiz_id: self.quiz_id,
            user_id: self.user_id,
            started_at: self.started_at,
            completed_at: self.completed_at,
            score_percentage: self.score_percentage,
            is_passed: self.is_passed,
            answers: self.answers,
        }
    }
}

/// Header row of an attempt, without its answers.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AttemptRow {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub score_percentage: f64,
    pub is_passed: bool,
}

impl From<&Attempt> for AttemptRow {
    fn from(a: &Attempt) -> Self {
        Self {
            id: a.id,
            quiz_id: a.quiz_id,
            user_id: a.user_id,
            started_at: a.started_at,
            completed_at: a.completed_at,
            score_percentage: a.score_percentage,
            is_passed: a.is_passed,
        }
    }
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub quiz_attempt_id: i64,
    pub score_percentage: f64,
    pub is_passed: bool,
}

/// A user's view of their own attempts on a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAttemptSummary {
    pub id: i64,
    pub score_percentage: f64,
    pub is_passed: bool,
    pub completed_at: DateTime<Utc>,
}

impl From<AttemptRow> for UserAttemptSummary {
    fn from(row: AttemptRow) -> Self {
        Self {
            id: row.id,
            score_percentage: row.score_percentage,
            is_passed: row.is_passed,
            completed_at: row.completed_at,
        }
    }
}

/// Privileged view of all attempts on a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAttemptSummary {
    pub user_id: i64,
    pub score_percentage: f64,
    pub is_passed: bool,
    pub completed_at: DateTime<Utc>,
}

impl From<AttemptRow> for QuizAttemptSummary {
    fn from(row: AttemptRow) -> Self {
        Self {
            user_id: row.user_id,
            score_percentage: row.score_percentage,
            is_passed: row.is_passed,
            completed_at: row.completed_at,
        }
    }
}
