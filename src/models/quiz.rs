// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A quiz aggregate, loaded as one tree together with its questions and answer options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub time_limit_in_minutes: i32,

    /// Ceiling on stored attempts per (quiz, user). Always >= 1.
    pub max_attempts_per_user: i32,

    /// Inclusive pass threshold in the range 0..=100.
    pub passing_score_percentage: i32,

    pub is_published: bool,

    /// Ordered by question id.
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn question(&self, question_id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

/// Represents the 'questions' table. Owned by exactly one quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub text: String,
    pub answer_options: Vec<AnswerOption>,
}

impl Question {
    pub fn answer_option(&self, answer_option_id: i64) -> Option<&AnswerOption> {
        self.answer_options.iter().find(|a| a.id == answer_option_id)
    }
}

/// Represents the 'answer_options' table. Owned by exactly one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AnswerOption {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub is_correct: bool,
}

/// DTO for sending a quiz to clients (correctness flags stripped).
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicQuiz {
    pub id: i64,
    pub title: String,
    pub time_limit_in_minutes: i32,
    pub max_attempts_per_user: i32,
    pub passing_score_percentage: i32,
    pub is_published: bool,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub text: String,
    pub answer_options: Vec<PublicAnswerOption>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublicAnswerOption {
    pub id: i64,
    pub text: String,
}

impl From<Quiz> for PublicQuiz {
    fn from(quiz: Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title,
            time_limit_in_minutes: quiz.time_limit_in_minutes,
            max_attempts_per_user: quiz.max_attempts_per_user,
            passing_score_percentage: quiz.passing_score_percentage,
            is_published: quiz.is_published,
            questions: quiz.questions.into_iter().map(PublicQuestion::from).collect(),
        }
    }
}

impl From<Question> for PublicQuestion {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            text: question.text,
            answer_options: question
                .answer_options
                .into_iter()
                .map(|a| PublicAnswerOption {
                    id: a.id,
                    text: a.text,
                })
                .collect(),
        }
    }
}

/// Overview row for the published-quizzes listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuizOverview {
    pub id: i64,
    pub title: String,
    pub time_limit_in_minutes: i32,
    pub max_attempts_per_user: i32,
    pub passing_score_percentage: i32,
}

impl From<&Quiz> for QuizOverview {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            time_limit_in_minutes: quiz.time_limit_in_minutes,
            max_attempts_per_user: quiz.max_attempts_per_user,
            passing_score_percentage: quiz.passing_score_percentage,
        }
    }
}

/// DTO for creating a quiz or replacing its settings.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(range(min = 1, message = "Time limit must be at least one minute."))]
    pub time_limit_in_minutes: i32,
    #[validate(range(min = 1, message = "At least one attempt must be allowed."))]
    pub max_attempts_per_user: i32,
    #[validate(range(min = 0, max = 100, message = "Passing score must be between 0 and 100."))]
    pub passing_score_percentage: i32,
    #[serde(default)]
    pub is_published: bool,
}

/// DTO for adding a question (with its options) to a quiz.
///
/// At least one option is required. Whether any option is marked correct is
/// left to the author: a quiz without a correct option is accepted as-is.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    #[validate(custom(function = validate_answer_options))]
    pub answer_options: Vec<CreateAnswerOptionRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAnswerOptionRequest {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

fn validate_answer_options(
    options: &[CreateAnswerOptionRequest],
) -> Result<(), validator::ValidationError> {
    if options.is_empty() {
        return Err(validator::ValidationError::new("answer_options_cannot_be_empty"));
    }
    for opt in options {
        if opt.text.is_empty() {
            return Err(validator::ValidationError::new("answer_option_text_empty"));
        }
        if opt.text.len() > 500 {
            return Err(validator::ValidationError::new("answer_option_too_long"));
        }
    }
    Ok(())
}
