pub mod admin;
pub mod auth;
pub mod cards;
pub mod fallback;
pub mod health;
pub mod metrics;
pub mod quiz;
pub mod skills;
pub mod student;

use crate::core::error::PageError;
use crate::core::state::AppState;
use crate::models::user::Role;
use crate::stores::session_store::{Flash, SessionUser};
use crate::utils::auth::{session_cookie, session_token};
use crate::utils::time::current_timestamp;
use axum::{
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use tracing::warn;

/// The signed-in user behind a request
pub struct Visitor {
    pub token: String,
    pub user: SessionUser,
}

pub fn current_visitor(state: &AppState, headers: &HeaderMap) -> Option<Visitor> {
    let token = session_token(headers)?;
    let user = state.sessions.user(&token, current_timestamp())?;
    Some(Visitor { token, user })
}

/// Signed-in visitor with the given role, otherwise back to the login page
pub fn require_role(state: &AppState, headers: &HeaderMap, role: Role) -> Result<Visitor, PageError> {
    match current_visitor(state, headers) {
        Some(visitor) if visitor.user.role == role => Ok(visitor),
        Some(visitor) => {
            warn!(
                user = %visitor.user.username,
                required = role.as_str(),
                "Role check failed"
            );
            Err(PageError::LoginRequired)
        }
        None => Err(PageError::LoginRequired),
    }
}

pub fn take_flashes(state: &AppState, headers: &HeaderMap) -> Vec<Flash> {
    session_token(headers)
        .map(|token| state.sessions.take_flashes(&token))
        .unwrap_or_default()
}

/// Queue a flash for the next page and redirect there
///
/// Visitors without a live session get an anonymous one to carry the message.
pub fn flash_redirect(state: &AppState, headers: &HeaderMap, flash: Flash, location: &str) -> Response {
    let now = current_timestamp();

    if let Some(token) = session_token(headers) {
        if state.sessions.get(&token, now).is_some() && state.sessions.push_flash(&token, flash.clone()) {
            return Redirect::to(location).into_response();
        }
    }

    let token = state.sessions.create(None, now);
    state.sessions.push_flash(&token, flash);

    (
        [(header::SET_COOKIE, session_cookie(&token, state.sessions.ttl()))],
        Redirect::to(location),
    )
        .into_response()
}
