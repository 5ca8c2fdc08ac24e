use crate::core::error::PageError;
use axum::{
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};

/// Browsers go back to the login page, everything else gets a JSON 404
pub async fn fallback_handler(headers: HeaderMap) -> Response {
    let accepts_html = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/html"));

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let is_browser = accepts_html
        || user_agent.contains("Mozilla")
        || user_agent.contains("Chrome")
        || user_agent.contains("Safari")
        || user_agent.contains("Firefox")
        || user_agent.contains("Edge");

    if is_browser {
        return Redirect::to("/").into_response();
    }

    PageError::NotFound("no such endpoint".to_string()).into_response()
}
