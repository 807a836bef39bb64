// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, patch, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{attempt, auth, quiz},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public catalog reads, authenticated submission/attempt routes and
///   admin-only authoring routes share the `/api` prefix.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (repositories, submission engine, config).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let public_routes = Router::new()
        .route("/quizzes", get(quiz::list_quizzes))
        .route("/quizzes/published", get(quiz::list_published))
        .route("/quizzes/{id}", get(quiz::get_quiz));

    let user_routes = Router::new()
        .route("/quizzes/{id}/submit", post(attempt::submit_quiz))
        .route("/quizzes/{id}/attempts/me", get(attempt::my_attempts))
        .route("/attempts/{id}", get(attempt::get_attempt))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/quizzes", post(quiz::create_quiz))
        .route(
            "/quizzes/{id}",
            put(quiz::update_quiz).delete(quiz::delete_quiz),
        )
        .route("/quizzes/{id}/publish", patch(quiz::publish_quiz))
        .route("/quizzes/{id}/unpublish", patch(quiz::unpublish_quiz))
        .route("/quizzes/{id}/questions", post(quiz::add_question))
        .route("/quizzes/{id}/attempts", get(attempt::quiz_attempts))
        .route("/questions/{id}", delete(quiz::delete_question))
        // Double middleware protection: Auth first (outermost), then Admin check
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api_routes = public_routes.merge(user_routes).merge(admin_routes);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
