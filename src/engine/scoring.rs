// src/engine/scoring.rs

use std::collections::HashSet;

use super::error::SubmissionError;
use crate::models::{attempt::SubmittedAnswer, quiz::Quiz};

/// Outcome of scoring one submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub correct_count: usize,
    pub total_questions: usize,
    /// `correct_count / total_questions * 100`, not rounded.
    pub percentage: f64,
    /// `percentage >= quiz.passing_score_percentage`.
    pub passed: bool,
}

/// Scores `answers` against `quiz`.
///
/// The denominator is the quiz's question count. The answer set is re-checked
/// on its own: it must hold exactly one answer per question, and every
/// reference must resolve. An unvalidated set fails instead of scoring out of
/// range.
pub fn score_submission(quiz: &Quiz, answers: &[SubmittedAnswer]) -> Result<Score, SubmissionError> {
    let total_questions = quiz.questions.len();
    if total_questions == 0 {
        return Err(SubmissionError::QuizHasNoQuestions);
    }
    let incomplete = SubmissionError::IncompleteSubmission {
        expected: total_questions,
        received: answers.len(),
    };
    if answers.len() != total_questions {
        return Err(incomplete);
    }

    let mut scored = HashSet::with_capacity(total_questions);
    let mut correct_count = 0;
    for answer in answers {
        let option = quiz
            .question(answer.question_id)
            .and_then(|q| q.answer_option(answer.selected_answer_option_id))
            .ok_or(SubmissionError::InvalidAnswerReference {
                question_id: answer.question_id,
                answer_option_id: answer.selected_answer_option_id,
            })?;

        if !scored.insert(answer.question_id) {
            return Err(incomplete);
        }
        if option.is_correct {
            correct_count += 1;
        }
    }

    let percentage = correct_count as f64 / total_questions as f64 * 100.0;
    let passed = percentage >= f64::from(quiz.passing_score_percentage);

    Ok(Score {
        correct_count,
        total_questions,
        percentage,
        passed,
    })
}
