// src/repository/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::{AttemptRepository, QuizRepository, RepositoryError, UserRepository};
use crate::models::{
    attempt::{Attempt, AttemptAnswer, AttemptRow, NewAttempt},
    quiz::{AnswerOption, CreateQuestionRequest, Question, Quiz, QuizRequest},
    user::{NewUser, User},
};

/// PostgreSQL-backed store for quizzes, attempts and users.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attaches questions and answer options to the given quiz rows.
    async fn load_trees(&self, rows: Vec<QuizRow>) -> Result<Vec<Quiz>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let quiz_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let questions = sqlx::query_as::<_, QuestionRow>(
            "SELECT id, quiz_id, text FROM questions WHERE quiz_id = ANY($1) ORDER BY id",
        )
        .bind(&quiz_ids)
        .fetch_all(&self.pool)
        .await?;

        let question_ids: Vec<i64> = questions.iter().map(|q| q.id).collect();

        let options = sqlx::query_as::<_, AnswerOption>(
            r#"
            SELECT id, question_id, text, is_correct
            FROM answer_options
            WHERE question_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&question_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut options_by_question: HashMap<i64, Vec<AnswerOption>> = HashMap::new();
        for opt in options {
            options_by_question.entry(opt.question_id).or_default().push(opt);
        }

        let mut questions_by_quiz: HashMap<i64, Vec<Question>> = HashMap::new();
        for q in questions {
            questions_by_quiz.entry(q.quiz_id).or_default().push(Question {
                id: q.id,
                quiz_id: q.quiz_id,
                text: q.text,
                answer_options: options_by_question.remove(&q.id).unwrap_or_default(),
            });
        }

        Ok(rows
            .into_iter()
            .map(|r| {
                let questions = questions_by_quiz.remove(&r.id).unwrap_or_default();
                r.into_quiz(questions)
            })
            .collect())
    }
}

#[derive(FromRow)]
struct QuizRow {
    id: i64,
    title: String,
    time_limit_in_minutes: i32,
    max_attempts_per_user: i32,
    passing_score_percentage: i32,
    is_published: bool,
}

impl QuizRow {
    fn into_quiz(self, questions: Vec<Question>) -> Quiz {
        Quiz {
            id: self.id,
            title: self.title,
            time_limit_in_minutes: self.time_limit_in_minutes,
            max_attempts_per_user: self.max_attempts_per_user,
            passing_score_percentage: self.passing_score_percentage,
            is_published: self.is_published,
            questions,
        }
    }
}

#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    quiz_id: i64,
    text: String,
}

const QUIZ_COLUMNS: &str =
    "id, title, time_limit_in_minutes, max_attempts_per_user, passing_score_percentage, is_published";

const ATTEMPT_COLUMNS: &str =
    "id, quiz_id, user_id, started_at, completed_at, score_percentage, is_passed";

#[async_trait]
impl QuizRepository for PgStore {
    async fn find_quiz(&self, quiz_id: i64) -> Result<Option<Quiz>, RepositoryError> {
        let row = sqlx::query_as::<_, QuizRow>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"
        ))
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.load_trees(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, RepositoryError> {
        let rows = sqlx::query_as::<_, QuizRow>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.load_trees(rows).await
    }

    async fn create_quiz(&self, req: &QuizRequest) -> Result<Quiz, RepositoryError> {
        let row = sqlx::query_as::<_, QuizRow>(&format!(
            r#"
            INSERT INTO quizzes
            (title, time_limit_in_minutes, max_attempts_per_user, passing_score_percentage, is_published)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {QUIZ_COLUMNS}
            "#
        ))
        .bind(&req.title)
        .bind(req.time_limit_in_minutes)
        .bind(req.max_attempts_per_user)
        .bind(req.passing_score_percentage)
        .bind(req.is_published)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_quiz(Vec::new()))
    }

    async fn update_quiz(&self, quiz_id: i64, req: &QuizRequest) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE quizzes SET
                title = $1,
                time_limit_in_minutes = $2,
                max_attempts_per_user = $3,
                passing_score_percentage = $4,
                is_published = $5
            WHERE id = $6
            "#,
        )
        .bind(&req.title)
        .bind(req.time_limit_in_minutes)
        .bind(req.max_attempts_per_user)
        .bind(req.passing_score_percentage)
        .bind(req.is_published)
        .bind(quiz_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_quiz(&self, quiz_id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(quiz_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_published(&self, quiz_id: i64, published: bool) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE quizzes SET is_published = $1 WHERE id = $2")
            .bind(published)
            .bind(quiz_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_question(
        &self,
        quiz_id: i64,
        req: &CreateQuestionRequest,
    ) -> Result<Option<Question>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM quizzes WHERE id = $1")
            .bind(quiz_id)
            .fetch_optional(&mut *tx)
            .await?;

        if exists.is_none() {
            return Ok(None);
        }

        let question_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO questions (quiz_id, text) VALUES ($1, $2) RETURNING id",
        )
        .bind(quiz_id)
        .bind(&req.text)
        .fetch_one(&mut *tx)
        .await?;

        let mut answer_options = Vec::with_capacity(req.answer_options.len());
        if !req.answer_options.is_empty() {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO answer_options (question_id, text, is_correct) ");
            builder.push_values(&req.answer_options, |mut b, opt| {
                b.push_bind(question_id)
                    .push_bind(&opt.text)
                    .push_bind(opt.is_correct);
            });
            builder.push(" RETURNING id, question_id, text, is_correct");

            answer_options = builder
                .build_query_as::<AnswerOption>()
                .fetch_all(&mut *tx)
                .await?;
            answer_options.sort_by_key(|a| a.id);
        }

        tx.commit().await?;

        Ok(Some(Question {
            id: question_id,
            quiz_id,
            text: req.text.clone(),
            answer_options,
        }))
    }

    async fn delete_question(&self, question_id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(question_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AttemptRepository for PgStore {
    async fn count_attempts(&self, quiz_id: i64, user_id: i64) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM quiz_attempts WHERE quiz_id = $1 AND user_id = $2",
        )
        .bind(quiz_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn insert_if_under_limit(
        &self,
        attempt: &NewAttempt,
        limit: i64,
    ) -> Result<Option<i64>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Serializes count + insert per (quiz, user); released on commit/rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("quiz_attempt:{}:{}", attempt.quiz_id, attempt.user_id))
            .execute(&mut *tx)
            .await?;

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM quiz_attempts WHERE quiz_id = $1 AND user_id = $2",
        )
        .bind(attempt.quiz_id)
        .bind(attempt.user_id)
        .fetch_one(&mut *tx)
        .await?;

        if count >= limit {
            tx.rollback().await?;
            return Ok(None);
        }

        let attempt_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO quiz_attempts
            (quiz_id, user_id, started_at, completed_at, score_percentage, is_passed)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(attempt.quiz_id)
        .bind(attempt.user_id)
        .bind(attempt.started_at)
        .bind(attempt.completed_at)
        .bind(attempt.score_percentage)
        .bind(attempt.is_passed)
        .fetch_one(&mut *tx)
        .await?;

        if !attempt.answers.is_empty() {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO quiz_attempt_answers (quiz_attempt_id, question_id, selected_answer_option_id) ",
            );
            builder.push_values(&attempt.answers, |mut b, answer| {
                b.push_bind(attempt_id)
                    .push_bind(answer.question_id)
                    .push_bind(answer.selected_answer_option_id);
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(Some(attempt_id))
    }

    async fn list_for_user(&self, quiz_id: i64, user_id: i64) -> Result<Vec<AttemptRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, AttemptRow>(&format!(
            r#"
            SELECT {ATTEMPT_COLUMNS}
            FROM quiz_attempts
            WHERE quiz_id = $1 AND user_id = $2
            ORDER BY completed_at, id
            "#
        ))
        .bind(quiz_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn list_for_quiz(&self, quiz_id: i64) -> Result<Vec<AttemptRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, AttemptRow>(&format!(
            r#"
            SELECT {ATTEMPT_COLUMNS}
            FROM quiz_attempts
            WHERE quiz_id = $1
            ORDER BY completed_at, id
            "#
        ))
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_attempt(&self, attempt_id: i64) -> Result<Option<Attempt>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, AttemptRow>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE id = $1"
        ))
        .bind(attempt_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let answers = sqlx::query_as::<_, AttemptAnswer>(
            r#"
            SELECT question_id, selected_answer_option_id
            FROM quiz_attempt_answers
            WHERE quiz_attempt_id = $1
            ORDER BY id
            "#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Attempt {
            id: row.id,
            quiz_id: row.quiz_id,
            user_id: row.user_id,
            started_at: row.started_at,
            completed_at: row.completed_at,
            score_percentage: row.score_percentage,
            is_passed: row.is_passed,
            answers,
        }))
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, full_name, password, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, full_name, password, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, full_name, password, role, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(&user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Postgres error code for unique violation is 23505
            if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
                RepositoryError::Conflict(format!("Email '{}' already exists", user.email))
            } else {
                RepositoryError::from(e)
            }
        })
    }
}
