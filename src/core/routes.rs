// HTTP routes configuration

use crate::core::state::AppState;
use crate::handlers::{admin, auth, cards, fallback, health, metrics, quiz, skills, student};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Login and session
        .route("/", get(auth::index_handler))
        .route("/login", post(auth::login_handler))
        .route("/logout", get(auth::logout_handler))

        // Admin pages (admin session)
        .route("/admin", get(admin::admin_dashboard_handler))
        .route("/admin/generate", post(admin::admin_generate_handler))

        // Student pages (student session)
        .route("/student", get(student::student_dashboard_handler))
        .route("/skills/{skill}", get(skills::skill_page_handler))
        .route("/skills/{skill}/{serial}", get(skills::skill_page_with_serial_handler))
        .route("/api/validate_card", get(cards::validate_card_handler))

        // Quizzes (any session)
        .route("/quiz/{skill}", get(quiz::quiz_page_handler))
        .route("/submit_quiz/{skill}", post(quiz::submit_quiz_handler))

        // Monitoring
        .route("/health", get(health::health_handler))
        .route("/metrics", get(metrics::metrics_handler))

        .fallback(fallback::fallback_handler)

        .with_state(state)
}
