// src/seed.rs

use crate::{
    config::Config,
    error::AppError,
    models::{
        quiz::{CreateAnswerOptionRequest, CreateQuestionRequest, QuizRequest},
        user::{NewUser, ROLE_ADMIN},
    },
    repository::{QuizRepository, UserRepository},
    utils::hash::hash_password,
};

/// Creates the configured admin account if it does not exist yet.
pub async fn seed_admin_user(users: &dyn UserRepository, config: &Config) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };

    let email = email.trim().to_lowercase();
    if users.find_user_by_email(&email).await?.is_some() {
        return Ok(());
    }

    tracing::info!("Seeding admin user: {}", email);
    users
        .create_user(&NewUser {
            email,
            full_name: "Admin User".to_string(),
            password_hash: hash_password(password)?,
            role: ROLE_ADMIN.to_string(),
        })
        .await?;
    tracing::info!("Admin user created successfully.");

    Ok(())
}

/// Creates the "Security Awareness" demo quiz when the catalog is empty.
pub async fn seed_demo_quiz(quizzes: &dyn QuizRepository) -> Result<(), AppError> {
    if !quizzes.list_quizzes().await?.is_empty() {
        return Ok(());
    }

    let quiz = quizzes
        .create_quiz(&QuizRequest {
            title: "Security Awareness".to_string(),
            time_limit_in_minutes: 30,
            max_attempts_per_user: 3,
            passing_score_percentage: 80,
            is_published: true,
        })
        .await?;

    let questions = [
        (
            "What is the strongest password?",
            [("Password123", false), ("A long password with symbols and numbers", true)],
        ),
        (
            "What should you do when you receive a phishing email?",
            [("Ignore the email", false), ("Report it to IT security", true)],
        ),
    ];

    for (text, options) in questions {
        let req = CreateQuestionRequest {
            text: text.to_string(),
            answer_options: options
                .iter()
                .map(|(text, is_correct)| CreateAnswerOptionRequest {
                    text: text.to_string(),
                    is_correct: *is_correct,
                })
                .collect(),
        };
        quizzes.add_question(quiz.id, &req).await?;
    }

    tracing::info!("Seeded demo quiz {}", quiz.id);
    Ok(())
}
