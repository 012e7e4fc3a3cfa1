// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, quiz, session},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (session, quiz, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store, session registry, event bridge).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let session_routes = Router::new()
        .route("/join", post(session::join))
        .route(
            "/{participant_id}",
            get(session::get_session).delete(session::leave),
        )
        .route("/{participant_id}/answer", post(session::answer));

    let quiz_routes = Router::new()
        .route("/active", get(quiz::get_active_quiz))
        .route("/{id}/leaderboard", get(quiz::get_leaderboard));

    let admin_routes = Router::new()
        .route(
            "/questions",
            get(admin::list_questions).post(admin::create_question),
        )
        .route("/quizzes", post(admin::create_quiz))
        .route("/quizzes/{id}/publish", post(admin::publish_quiz))
        .route("/quizzes/{id}/submissions", get(admin::list_submissions));

    Router::new()
        .nest("/api/session", session_routes)
        .nest("/api/quiz", quiz_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
