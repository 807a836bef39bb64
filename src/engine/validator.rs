// src/engine/validator.rs

use std::collections::HashSet;

use super::error::SubmissionError;
use crate::models::{attempt::SubmittedAnswer, quiz::Quiz};

/// Checks that `answers` is a well-formed answer set for `quiz`.
///
/// Checks run in order and stop at the first failure:
/// 1. quiz is published and has at least one question;
/// 2. the number of answers equals the number of questions;
/// 3. each answer names a question of this quiz and an option of that question;
/// 4. no question is answered twice (so, with 2., every question is answered once).
pub fn validate_submission(quiz: &Quiz, answers: &[SubmittedAnswer]) -> Result<(), SubmissionError> {
    if !quiz.is_published {
        return Err(SubmissionError::QuizNotPublished);
    }

    if quiz.questions.is_empty() {
        return Err(SubmissionError::QuizHasNoQuestions);
    }

    let incomplete = || SubmissionError::IncompleteSubmission {
        expected: quiz.questions.len(),
        received: answers.len(),
    };

    if answers.len() != quiz.questions.len() {
        return Err(incomplete());
    }

    for answer in answers {
        let belongs = quiz
            .question(answer.question_id)
            .is_some_and(|q| q.answer_option(answer.selected_answer_option_id).is_some());

        if !belongs {
            return Err(SubmissionError::InvalidAnswerReference {
                question_id: answer.question_id,
                answer_option_id: answer.selected_answer_option_id,
            });
        }
    }

    let mut seen = HashSet::with_capacity(answers.len());
    if !answers.iter().all(|a| seen.insert(a.question_id)) {
        return Err(incomplete());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{answer, two_question_quiz};

    #[test]
    fn accepts_complete_valid_submission() {
        let quiz = two_question_quiz(1, 80);
        assert!(validate_submission(&quiz, &[answer(1, 1), answer(2, 4)]).is_ok());
    }

    #[test]
    fn accepts_answers_in_any_order() {
        let quiz = two_question_quiz(1, 80);
        assert!(validate_submission(&quiz, &[answer(2, 3), answer(1, 2)]).is_ok());
    }

    #[test]
    fn rejects_unpublished_quiz() {
        let mut quiz = two_question_quiz(1, 80);
        quiz.is_published = false;
        let err = validate_submission(&quiz, &[answer(1, 1), answer(2, 4)]).unwrap_err();
        assert!(matches!(err, SubmissionError::QuizNotPublished));
    }

    #[test]
    fn rejects_quiz_without_questions() {
        let mut quiz = two_question_quiz(1, 80);
        quiz.questions.clear();
        let err = validate_submission(&quiz, &[]).unwrap_err();
        assert!(matches!(err, SubmissionError::QuizHasNoQuestions));
    }

    #[test]
    fn rejects_missing_answer_even_if_correct() {
        let quiz = two_question_quiz(1, 80);
        let err = validate_submission(&quiz, &[answer(1, 1)]).unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::IncompleteSubmission {
                expected: 2,
                received: 1
            }
        ));
    }

    #[test]
    fn rejects_extra_answers() {
        let quiz = two_question_quiz(1, 80);
        let err = validate_submission(&quiz, &[answer(1, 1), answer(2, 4), answer(2, 3)]).unwrap_err();
        assert!(matches!(err, SubmissionError::IncompleteSubmission { .. }));
    }

    #[test]
    fn count_check_runs_before_reference_check() {
        let quiz = two_question_quiz(1, 80);
        let err = validate_submission(&quiz, &[answer(99, 99)]).unwrap_err();
        assert!(matches!(err, SubmissionError::IncompleteSubmission { .. }));
    }

    #[test]
    fn rejects_option_of_another_question() {
        let quiz = two_question_quiz(1, 80);
        // Option 4 belongs to question 2.
        let err = validate_submission(&quiz, &[answer(1, 4), answer(2, 3)]).unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::InvalidAnswerReference {
                question_id: 1,
                answer_option_id: 4
            }
        ));
    }

    #[test]
    fn rejects_unknown_question() {
        let quiz = two_question_quiz(1, 80);
        let err = validate_submission(&quiz, &[answer(1, 1), answer(7, 3)]).unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::InvalidAnswerReference { question_id: 7, .. }
        ));
    }

    #[test]
    fn rejects_duplicate_question_with_matching_count() {
        let quiz = two_question_quiz(1, 80);
        let err = validate_submission(&quiz, &[answer(1, 1), answer(1, 2)]).unwrap_err();
        assert!(matches!(err, SubmissionError::IncompleteSubmission { .. }));
    }
}
