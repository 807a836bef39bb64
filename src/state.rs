// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    engine::{SubmissionService, SystemClock},
    repository::{AttemptRepository, QuizRepository, UserRepository},
};

#[derive(Clone)]
pub struct AppState {
    pub quizzes: Arc<dyn QuizRepository>,
    pub users: Arc<dyn UserRepository>,
    pub submissions: Arc<SubmissionService>,
    pub config: Config,
}

impl AppState {
    /// Wires every repository and the submission engine to one store.
    pub fn from_store<S>(store: Arc<S>, config: Config) -> Self
    where
        S: QuizRepository + AttemptRepository + UserRepository + 'static,
    {
        let submissions = SubmissionService::new(store.clone(), store.clone(), Arc::new(SystemClock));
        Self {
            quizzes: store.clone(),
            users: store,
            submissions: Arc::new(submissions),
            config,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<SubmissionService> {
    fn from_ref(state: &AppState) -> Self {
        state.submissions.clone()
    }
}
