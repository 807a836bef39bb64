// src/engine/admission.rs

use std::sync::Arc;

use super::{
    clock::Clock,
    error::SubmissionError,
    scoring::score_submission,
    validator::validate_submission,
};
use crate::{
    models::attempt::{
        Attempt, AttemptAnswer, NewAttempt, QuizAttemptSummary, Submission, SubmissionOutcome,
        UserAttemptSummary,
    },
    repository::{AttemptRepository, QuizRepository},
};

/// Admission controller for quiz submissions.
///
/// Holds no state of its own between calls; everything lives in the ledger.
pub struct SubmissionService {
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn AttemptRepository>,
    clock: Arc<dyn Clock>,
}

impl SubmissionService {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn AttemptRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            quizzes,
            attempts,
            clock,
        }
    }

    /// Scores `submission` for `user_id` and records one new attempt.
    ///
    /// Identical resubmissions create distinct attempts until the quiz's
    /// attempt ceiling is reached.
    pub async fn submit(
        &self,
        quiz_id: i64,
        submission: &Submission,
        user_id: i64,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let result = self.admit(quiz_id, submission, user_id).await;

        match &result {
            Ok(outcome) => tracing::info!(
                quiz_id,
                user_id,
                attempt_id = outcome.quiz_attempt_id,
                score = outcome.score_percentage,
                passed = outcome.is_passed,
                "Submission scored"
            ),
            Err(SubmissionError::PersistenceFailure(e)) => {
                tracing::error!(quiz_id, user_id, "Failed to persist attempt: {:?}", e)
            }
            Err(e) => tracing::info!(quiz_id, user_id, reason = e.code(), "Submission rejected"),
        }

        result
    }

    async fn admit(
        &self,
        quiz_id: i64,
        submission: &Submission,
        user_id: i64,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        if submission.quiz_id != quiz_id {
            return Err(SubmissionError::QuizIdMismatch {
                requested: quiz_id,
                submitted: submission.quiz_id,
            });
        }

        let quiz = self
            .quizzes
            .find_quiz(quiz_id)
            .await?
            .ok_or(SubmissionError::QuizNotFound(quiz_id))?;

        validate_submission(&quiz, &submission.answers)?;

        let max_attempts = quiz.max_attempts_per_user;
        let limit = i64::from(max_attempts);
        let count = self.attempts.count_attempts(quiz.id, user_id).await?;
        tracing::debug!(quiz_id, user_id, count, limit, "Checked attempt ceiling");
        if count >= limit {
            return Err(SubmissionError::MaxAttemptsReached { max_attempts });
        }

        let score = score_submission(&quiz, &submission.answers)?;

        let completed_at = self.clock.now();
        let started_at = submission
            .started_at
            .map_or(completed_at, |s| s.min(completed_at));

        let attempt = NewAttempt {
            quiz_id: quiz.id,
            user_id,
            started_at,
            completed_at,
            score_percentage: score.percentage,
            is_passed: score.passed,
            answers: submission
                .answers
                .iter()
                .copied()
                .map(AttemptAnswer::from)
                .collect(),
        };

        // The ledger re-checks the ceiling atomically with the insert.
        let attempt_id = self
            .attempts
            .insert_if_under_limit(&attempt, limit)
            .await?
            .ok_or(SubmissionError::MaxAttemptsReached { max_attempts })?;

        Ok(SubmissionOutcome {
            quiz_attempt_id: attempt_id,
            score_percentage: score.percentage,
            is_passed: score.passed,
        })
    }

    /// The caller's attempts on a quiz, oldest first.
    pub async fn attempts_for_user(
        &self,
        quiz_id: i64,
        user_id: i64,
    ) -> Result<Vec<UserAttemptSummary>, SubmissionError> {
        let rows = self.attempts.list_for_user(quiz_id, user_id).await?;
        Ok(rows.into_iter().map(UserAttemptSummary::from).collect())
    }

    /// Every attempt on a quiz. Privileged.
    pub async fn attempts_for_quiz(
        &self,
        quiz_id: i64,
    ) -> Result<Vec<QuizAttemptSummary>, SubmissionError> {
        let rows = self.attempts.list_for_quiz(quiz_id).await?;
        Ok(rows.into_iter().map(QuizAttemptSummary::from).collect())
    }

    pub async fn attempt(&self, attempt_id: i64) -> Result<Option<Attempt>, SubmissionError> {
        Ok(self.attempts.find_attempt(attempt_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::{
        engine::test_support::{FixedClock, answer},
        models::{
            attempt::AttemptRow,
            quiz::{CreateAnswerOptionRequest, CreateQuestionRequest, QuizRequest},
        },
        repository::{MemoryStore, RepositoryError},
    };

    /// Creates the two-question quiz in `store`: Q1 correct=A, Q2 correct=B.
    async fn seed_quiz(store: &MemoryStore, max_attempts: i32, passing: i32, published: bool) -> SeededQuiz {
        let quiz = store
            .create_quiz(&QuizRequest {
                title: "Security Awareness".to_string(),
                time_limit_in_minutes: 30,
                max_attempts_per_user: max_attempts,
                passing_score_percentage: passing,
                is_published: published,
            })
            .await
            .unwrap();

        let mut ids = Vec::new();
        for correct in ["A", "B"] {
            let q = store
                .add_question(
                    quiz.id,
                    &CreateQuestionRequest {
                        text: format!("Pick {correct}"),
                        answer_options: ["A", "B"]
                            .iter()
                            .map(|t| CreateAnswerOptionRequest {
                                text: t.to_string(),
                                is_correct: *t == correct,
                            })
                            .collect(),
                    },
                )
                .await
                .unwrap()
                .unwrap();
            let right = q.answer_options.iter().find(|a| a.is_correct).unwrap().id;
            let wrong = q.answer_options.iter().find(|a| !a.is_correct).unwrap().id;
            ids.push((q.id, right, wrong));
        }

        SeededQuiz { id: quiz.id, q1: ids[0], q2: ids[1] }
    }

    struct SeededQuiz {
        id: i64,
        q1: (i64, i64, i64),
        q2: (i64, i64, i64),
    }

    impl SeededQuiz {
        fn submission(&self, q1_right: bool, q2_right: bool) -> Submission {
            let pick = |(q, right, wrong): (i64, i64, i64), ok: bool| {
                answer(q, if ok { right } else { wrong })
            };
            Submission {
                quiz_id: self.id,
                answers: vec![pick(self.q1, q1_right), pick(self.q2, q2_right)],
                started_at: None,
            }
        }
    }

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 26, 16, 6, 32).unwrap()
    }

    fn service(store: Arc<MemoryStore>) -> SubmissionService {
        SubmissionService::new(store.clone(), store, Arc::new(FixedClock(now())))
    }

    #[tokio::test]
    async fn perfect_submission_passes_then_hits_ceiling() {
        let store = Arc::new(MemoryStore::new());
        let quiz = seed_quiz(&store, 1, 80, true).await;
        let svc = service(store.clone());

        let outcome = svc.submit(quiz.id, &quiz.submission(true, true), 7).await.unwrap();
        assert_eq!(outcome.score_percentage, 100.0);
        assert!(outcome.is_passed);

        let err = svc.submit(quiz.id, &quiz.submission(true, true), 7).await.unwrap_err();
        assert!(matches!(err, SubmissionError::MaxAttemptsReached { max_attempts: 1 }));
        assert_eq!(store.count_attempts(quiz.id, 7).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn half_correct_scores_fifty_and_fails() {
        let store = Arc::new(MemoryStore::new());
        let quiz = seed_quiz(&store, 1, 80, true).await;
        let svc = service(store);

        let outcome = svc.submit(quiz.id, &quiz.submission(true, false), 7).await.unwrap();
        assert_eq!(outcome.score_percentage, 50.0);
        assert!(!outcome.is_passed);
    }

    #[tokio::test]
    async fn identical_resubmissions_create_distinct_attempts() {
        let store = Arc::new(MemoryStore::new());
        let quiz = seed_quiz(&store, 3, 50, true).await;
        let svc = service(store);

        let first = svc.submit(quiz.id, &quiz.submission(true, true), 7).await.unwrap();
        let second = svc.submit(quiz.id, &quiz.submission(true, true), 7).await.unwrap();
        assert_ne!(first.quiz_attempt_id, second.quiz_attempt_id);

        // Another user has an independent ceiling.
        assert!(svc.submit(quiz.id, &quiz.submission(false, false), 8).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_quiz_id_mismatch_before_lookup() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store);
        let submission = Submission {
            quiz_id: 2,
            answers: vec![],
            started_at: None,
        };

        // Quiz 1 does not exist, but the mismatch is reported first.
        let err = svc.submit(1, &submission, 7).await.unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::QuizIdMismatch {
                requested: 1,
                submitted: 2
            }
        ));
    }

    #[tokio::test]
    async fn rejects_missing_quiz() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store);
        let submission = Submission {
            quiz_id: 5,
            answers: vec![answer(1, 1)],
            started_at: None,
        };

        let err = svc.submit(5, &submission, 7).await.unwrap_err();
        assert!(matches!(err, SubmissionError::QuizNotFound(5)));
    }

    #[tokio::test]
    async fn unpublished_quiz_never_reaches_scoring() {
        let store = Arc::new(MemoryStore::new());
        let quiz = seed_quiz(&store, 3, 80, false).await;
        let svc = service(store.clone());

        let err = svc.submit(quiz.id, &quiz.submission(true, true), 7).await.unwrap_err();
        assert!(matches!(err, SubmissionError::QuizNotPublished));
        assert_eq!(store.count_attempts(quiz.id, 7).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rejects_quiz_without_questions() {
        let store = Arc::new(MemoryStore::new());
        let quiz = store
            .create_quiz(&QuizRequest {
                title: "Empty".to_string(),
                time_limit_in_minutes: 5,
                max_attempts_per_user: 1,
                passing_score_percentage: 50,
                is_published: true,
            })
            .await
            .unwrap();
        let svc = service(store);
        let submission = Submission {
            quiz_id: quiz.id,
            answers: vec![],
            started_at: None,
        };

        let err = svc.submit(quiz.id, &submission, 7).await.unwrap_err();
        assert!(matches!(err, SubmissionError::QuizHasNoQuestions));
    }

    #[tokio::test]
    async fn rejects_incomplete_and_cross_question_answers() {
        let store = Arc::new(MemoryStore::new());
        let quiz = seed_quiz(&store, 3, 80, true).await;
        let svc = service(store.clone());

        let mut incomplete = quiz.submission(true, true);
        incomplete.answers.pop();
        let err = svc.submit(quiz.id, &incomplete, 7).await.unwrap_err();
        assert!(matches!(err, SubmissionError::IncompleteSubmission { .. }));

        // Q1 answered with an option of Q2.
        let crossed = Submission {
            quiz_id: quiz.id,
            answers: vec![answer(quiz.q1.0, quiz.q2.1), answer(quiz.q2.0, quiz.q2.1)],
            started_at: None,
        };
        let err = svc.submit(quiz.id, &crossed, 7).await.unwrap_err();
        assert!(matches!(err, SubmissionError::InvalidAnswerReference { .. }));

        assert_eq!(store.count_attempts(quiz.id, 7).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn ceiling_applies_even_to_perfect_score() {
        let store = Arc::new(MemoryStore::new());
        let quiz = seed_quiz(&store, 2, 80, true).await;
        let svc = service(store);

        svc.submit(quiz.id, &quiz.submission(false, false), 7).await.unwrap();
        svc.submit(quiz.id, &quiz.submission(true, false), 7).await.unwrap();
        let err = svc.submit(quiz.id, &quiz.submission(true, true), 7).await.unwrap_err();
        assert!(matches!(err, SubmissionError::MaxAttemptsReached { max_attempts: 2 }));
    }

    #[tokio::test]
    async fn persisted_attempt_records_answers_and_timestamps() {
        let store = Arc::new(MemoryStore::new());
        let quiz = seed_quiz(&store, 3, 80, true).await;
        let svc = service(store);

        let mut submission = quiz.submission(true, false);
        submission.started_at = Some(now() - Duration::minutes(12));
        let outcome = svc.submit(quiz.id, &submission, 7).await.unwrap();

        let attempt = svc.attempt(outcome.quiz_attempt_id).await.unwrap().unwrap();
        assert_eq!(attempt.user_id, 7);
        assert_eq!(attempt.completed_at, now());
        assert_eq!(attempt.started_at, now() - Duration::minutes(12));
        assert_eq!(attempt.score_percentage, 50.0);
        let recorded: Vec<_> = attempt.answers.iter().map(|a| a.selected_answer_option_id).collect();
        assert_eq!(recorded, vec![quiz.q1.1, quiz.q2.2]);
    }

    #[tokio::test]
    async fn start_time_defaults_to_completion_time() {
        let store = Arc::new(MemoryStore::new());
        let quiz = seed_quiz(&store, 3, 80, true).await;
        let svc = service(store);

        let outcome = svc.submit(quiz.id, &quiz.submission(true, true), 7).await.unwrap();
        let attempt = svc.attempt(outcome.quiz_attempt_id).await.unwrap().unwrap();
        assert_eq!(attempt.started_at, attempt.completed_at);
    }

    #[tokio::test]
    async fn attempt_queries_split_by_user() {
        let store = Arc::new(MemoryStore::new());
        let quiz = seed_quiz(&store, 3, 80, true).await;
        let svc = service(store);

        svc.submit(quiz.id, &quiz.submission(true, true), 7).await.unwrap();
        svc.submit(quiz.id, &quiz.submission(true, false), 7).await.unwrap();
        svc.submit(quiz.id, &quiz.submission(false, false), 8).await.unwrap();

        let mine = svc.attempts_for_user(quiz.id, 7).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].score_percentage, 100.0);
        assert_eq!(mine[1].score_percentage, 50.0);

        let all = svc.attempts_for_quiz(quiz.id).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all.iter().filter(|a| a.user_id == 8).count(), 1);

        assert!(svc.attempts_for_quiz(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_submissions_respect_ceiling() {
        let store = Arc::new(MemoryStore::new());
        let quiz = seed_quiz(&store, 3, 80, true).await;
        let svc = Arc::new(service(store.clone()));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let svc = svc.clone();
            let submission = quiz.submission(true, true);
            let quiz_id = quiz.id;
            handles.push(tokio::spawn(async move { svc.submit(quiz_id, &submission, 7).await }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(e) => assert!(matches!(e, SubmissionError::MaxAttemptsReached { .. })),
            }
        }

        assert_eq!(accepted, 3);
        assert_eq!(store.count_attempts(quiz.id, 7).await.unwrap(), 3);
    }

    /// Ledger whose every call fails.
    struct BrokenLedger;

    #[async_trait]
    impl AttemptRepository for BrokenLedger {
        async fn count_attempts(&self, _: i64, _: i64) -> Result<i64, RepositoryError> {
            Ok(0)
        }

        async fn insert_if_under_limit(&self, _: &NewAttempt, _: i64) -> Result<Option<i64>, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn list_for_user(&self, _: i64, _: i64) -> Result<Vec<AttemptRow>, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn list_for_quiz(&self, _: i64) -> Result<Vec<AttemptRow>, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn find_attempt(&self, _: i64) -> Result<Option<Attempt>, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn ledger_write_failure_is_propagated() {
        let store = Arc::new(MemoryStore::new());
        let quiz = seed_quiz(&store, 3, 80, true).await;
        let svc = SubmissionService::new(store, Arc::new(BrokenLedger), Arc::new(FixedClock(now())));

        let err = svc.submit(quiz.id, &quiz.submission(true, true), 7).await.unwrap_err();
        assert!(matches!(err, SubmissionError::PersistenceFailure(_)));
        assert_eq!(err.code(), "persistence_failure");
    }
}
