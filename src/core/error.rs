// Centralized error handling for the HTTP surfaces

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors raised by page routes (login, dashboards, skill pages)
#[derive(Error, Debug)]
pub enum PageError {
    /// Not signed in, or signed in with the wrong role
    #[error("Login required")]
    LoginRequired,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Too many login attempts, try again in a minute")]
    TooManyAttempts,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        use crate::models::views::ErrorResponse;

        let status = match &self {
            PageError::LoginRequired => return Redirect::to("/").into_response(),
            PageError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            PageError::NotFound(_) => StatusCode::NOT_FOUND,
            PageError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            PageError::Internal(e) => {
                tracing::error!(error = %e, "Page request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Errors raised by the card validation API
///
/// Rendered with the same `{status, message}` shape as claim outcomes.
#[derive(Error, Debug)]
pub enum CardApiError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for CardApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            CardApiError::AuthenticationRequired => StatusCode::FORBIDDEN,
            CardApiError::Internal(e) => {
                tracing::error!(error = %e, "Card validation failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(json!({
                "status": "error",
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Please log in to submit the quiz.")]
    LoginRequired,

    #[error("Quiz questions not found")]
    QuestionsUnavailable,

    #[error("Quiz not found")]
    QuizNotFound,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for QuizError {
    fn into_response(self) -> Response {
        let status = match &self {
            QuizError::LoginRequired => StatusCode::FORBIDDEN,
            QuizError::QuestionsUnavailable => StatusCode::NOT_FOUND,
            QuizError::QuizNotFound => StatusCode::NOT_FOUND,
            QuizError::Internal(e) => {
                tracing::error!(error = %e, "Quiz submission failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Error, Debug)]
pub enum MonitoringError {
    #[error("Invalid API key")]
    InvalidApiKey,
}

impl IntoResponse for MonitoringError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            MonitoringError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "Unauthorized"),
        };

        (status, message).into_response()
    }
}
