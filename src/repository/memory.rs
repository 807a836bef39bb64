// src/repository/memory.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{AttemptRepository, QuizRepository, RepositoryError, UserRepository};
use crate::models::{
    attempt::{Attempt, AttemptRow, NewAttempt},
    quiz::{AnswerOption, CreateQuestionRequest, Question, Quiz, QuizRequest},
    user::{NewUser, User},
};

/// In-process store backing all three repositories.
///
/// Every operation holds the single mutex for its whole duration, which makes
/// `insert_if_under_limit` atomic per (quiz, user).
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<MemoryData>,
}

#[derive(Default)]
struct MemoryData {
    quizzes: BTreeMap<i64, Quiz>,
    attempts: Vec<Attempt>,
    users: Vec<User>,
    last_quiz_id: i64,
    last_question_id: i64,
    last_option_id: i64,
    last_attempt_id: i64,
    last_user_id: i64,
}

fn next_id(last: &mut i64) -> i64 {
    *last += 1;
    *last
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_rows<'a>(attempts: impl Iterator<Item = &'a Attempt>) -> Vec<AttemptRow> {
    let mut rows: Vec<AttemptRow> = attempts.map(AttemptRow::from).collect();
    rows.sort_by(|a, b| a.completed_at.cmp(&b.completed_at).then(a.id.cmp(&b.id)));
    rows
}

#[async_trait]
impl QuizRepository for MemoryStore {
    async fn find_quiz(&self, quiz_id: i64) -> Result<Option<Quiz>, RepositoryError> {
        Ok(self.data.lock().await.quizzes.get(&quiz_id).cloned())
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, RepositoryError> {
        Ok(self.data.lock().await.quizzes.values().cloned().collect())
    }

    async fn create_quiz(&self, req: &QuizRequest) -> Result<Quiz, RepositoryError> {
        let mut data = self.data.lock().await;
        let quiz = Quiz {
            id: next_id(&mut data.last_quiz_id),
            title: req.title.clone(),
            time_limit_in_minutes: req.time_limit_in_minutes,
            max_attempts_per_user: req.max_attempts_per_user,
            passing_score_percentage: req.passing_score_percentage,
            is_published: req.is_published,
            questions: Vec::new(),
        };
        data.quizzes.insert(quiz.id, quiz.clone());
        Ok(quiz)
    }

    async fn update_quiz(&self, quiz_id: i64, req: &QuizRequest) -> Result<bool, RepositoryError> {
        let mut data = self.data.lock().await;
        let Some(quiz) = data.quizzes.get_mut(&quiz_id) else {
            return Ok(false);
        };
        quiz.title = req.title.clone();
        quiz.time_limit_in_minutes = req.time_limit_in_minutes;
        quiz.max_attempts_per_user = req.max_attempts_per_user;
        quiz.passing_score_percentage = req.passing_score_percentage;
        quiz.is_published = req.is_published;
        Ok(true)
    }

    async fn delete_quiz(&self, quiz_id: i64) -> Result<bool, RepositoryError> {
        let mut data = self.data.lock().await;
        if data.quizzes.remove(&quiz_id).is_none() {
            return Ok(false);
        }
        data.attempts.retain(|a| a.quiz_id != quiz_id);
        Ok(true)
    }

    async fn set_published(&self, quiz_id: i64, published: bool) -> Result<bool, RepositoryError> {
        let mut data = self.data.lock().await;
        match data.quizzes.get_mut(&quiz_id) {
            Some(quiz) => {
                quiz.is_published = published;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_question(
        &self,
        quiz_id: i64,
        req: &CreateQuestionRequest,
    ) -> Result<Option<Question>, RepositoryError> {
        let mut data = self.data.lock().await;
        if !data.quizzes.contains_key(&quiz_id) {
            return Ok(None);
        }

        let question_id = next_id(&mut data.last_question_id);
        let mut answer_options = Vec::with_capacity(req.answer_options.len());
        for opt in &req.answer_options {
            answer_options.push(AnswerOption {
                id: next_id(&mut data.last_option_id),
                question_id,
                text: opt.text.clone(),
                is_correct: opt.is_correct,
            });
        }

        let question = Question {
            id: question_id,
            quiz_id,
            text: req.text.clone(),
            answer_options,
        };

        if let Some(quiz) = data.quizzes.get_mut(&quiz_id) {
            quiz.questions.push(question.clone());
        }
        Ok(Some(question))
    }

    async fn delete_question(&self, question_id: i64) -> Result<bool, RepositoryError> {
        let mut data = self.data.lock().await;
        for quiz in data.quizzes.values_mut() {
            let before = quiz.questions.len();
            quiz.questions.retain(|q| q.id != question_id);
            if quiz.questions.len() != before {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl AttemptRepository for MemoryStore {
    async fn count_attempts(&self, quiz_id: i64, user_id: i64) -> Result<i64, RepositoryError> {
        let data = self.data.lock().await;
        let count = data
            .attempts
            .iter()
            .filter(|a| a.quiz_id == quiz_id && a.user_id == user_id)
            .count();
        Ok(count as i64)
    }

    async fn insert_if_under_limit(
        &self,
        attempt: &NewAttempt,
        limit: i64,
    ) -> Result<Option<i64>, RepositoryError> {
        let mut data = self.data.lock().await;
        let count = data
            .attempts
            .iter()
            .filter(|a| a.quiz_id == attempt.quiz_id && a.user_id == attempt.user_id)
            .count() as i64;

        if count >= limit {
            return Ok(None);
        }

        let id = next_id(&mut data.last_attempt_id);
        data.attempts.push(attempt.clone().into_attempt(id));
        Ok(Some(id))
    }

    async fn list_for_user(&self, quiz_id: i64, user_id: i64) -> Result<Vec<AttemptRow>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(sorted_rows(
            data.attempts
                .iter()
                .filter(|a| a.quiz_id == quiz_id && a.user_id == user_id),
        ))
    }

    async fn list_for_quiz(&self, quiz_id: i64) -> Result<Vec<AttemptRow>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(sorted_rows(data.attempts.iter().filter(|a| a.quiz_id == quiz_id)))
    }

    async fn find_attempt(&self, attempt_id: i64) -> Result<Option<Attempt>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data.attempts.iter().find(|a| a.id == attempt_id).cloned())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut data = self.data.lock().await;
        if data.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(format!(
                "Email '{}' already exists",
                user.email
            )));
        }

        let created = User {
            id: next_id(&mut data.last_user_id),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            password: user.password_hash.clone(),
            role: user.role.clone(),
            created_at: Some(Utc::now()),
        };
        data.users.push(created.clone());
        Ok(created)
    }
}
