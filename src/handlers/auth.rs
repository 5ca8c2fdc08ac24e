use crate::core::error::PageError;
use crate::core::state::AppState;
use crate::handlers::{current_visitor, flash_redirect, take_flashes};
use crate::models::skill::SKILLS;
use crate::models::user::Role;
use crate::models::views::{LoginForm, LoginView};
use crate::stores::session_store::{Flash, SessionUser};
use crate::utils::auth::{constant_time_eq, session_cookie, session_token};
use crate::utils::time::current_timestamp;
use axum::{
    extract::{ConnectInfo, State},
    http::{header, Extensions, HeaderMap},
    response::{IntoResponse, Json, Redirect, Response},
    Form,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tracing::{info, warn};

/// Login page
///
/// GET /
pub async fn index_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<LoginView> {
    let user = current_visitor(&state, &headers).map(|visitor| visitor.user.username);

    Json(LoginView {
        skills: SKILLS,
        user,
        flashes: take_flashes(&state, &headers),
    })
}

/// POST /login
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    extensions: Extensions,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    let ip = client_ip(
        &headers,
        &extensions,
        state.config.security.trust_forwarded_headers,
    );
    let now = current_timestamp();

    if state.login_throttle.is_blocked(ip, now) {
        warn!(ip = %ip, username = %form.username, "Login throttled");
        return Err(PageError::TooManyAttempts);
    }

    let user = state.storage.get_user(&form.username).await?;

    let user = match user {
        Some(user) if constant_time_eq(&form.password, &user.password) => user,
        _ => {
            warn!(ip = %ip, username = %form.username, "Invalid login attempt");
            state.login_throttle.record_failure(ip, now);
            state.metrics.record_login(false);
            return Ok(flash_redirect(
                &state,
                &headers,
                Flash::error("Invalid credentials"),
                "/",
            ));
        }
    };

    state.login_throttle.reset(ip);
    state.metrics.record_login(true);

    // Fresh token on every login
    if let Some(old) = session_token(&headers) {
        state.sessions.remove(&old);
    }

    let token = state.sessions.create(
        Some(SessionUser {
            username: user.username.clone(),
            role: user.role,
        }),
        now,
    );
    state
        .sessions
        .push_flash(&token, Flash::success("Login successful!"));

    let target = match user.role {
        Role::Admin => "/admin",
        Role::Student => "/student",
    };

    info!(user = %user.username, role = user.role.as_str(), "User logged in");

    Ok((
        [(header::SET_COOKIE, session_cookie(&token, state.sessions.ttl()))],
        Redirect::to(target),
    )
        .into_response())
}

/// GET /logout
///
/// The signed-in session is dropped. The "Logged out." flash rides on a new
/// anonymous session.
pub async fn logout_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        if let Some(user) = state.sessions.user(&token, current_timestamp()) {
            info!(user = %user.username, "User logged out");
        }
        state.sessions.remove(&token);
    }

    flash_redirect(&state, &headers, Flash::info("Logged out."), "/")
}

/// Client address for throttling
///
/// The socket peer by default. With `trust_forwarded` set, `X-Forwarded-For`
/// and then `X-Real-IP` win over the peer. Unix socket clients without
/// trusted headers all share the unspecified address.
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions, trust_forwarded: bool) -> IpAddr {
    let from_header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    let forwarded = if trust_forwarded {
        from_header("x-forwarded-for").or_else(|| from_header("x-real-ip"))
    } else {
        None
    };

    forwarded
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}
