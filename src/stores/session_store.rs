use crate::models::user::Role;
use crate::utils::auth::generate_session_token;
use crate::utils::time::is_expired;
use dashmap::DashMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
    Info,
}

/// One-shot message shown on the next page view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flash {
    pub category: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            category: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            category: FlashLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            category: FlashLevel::Info,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct Session {
    /// `None` for anonymous sessions that only carry flashes
    pub user: Option<SessionUser>,
    pub created_at: i64,
    pub flashes: Vec<Flash>,
}

/// Server-side sessions keyed by the cookie token
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: i64,
}

impl SessionStore {
    pub fn new(ttl: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> i64 {
        self.ttl
    }

    /// Start a session and return its token
    pub fn create(&self, user: Option<SessionUser>, now: i64) -> String {
        let token = generate_session_token();
        self.sessions.insert(
            token.clone(),
            Session {
                user,
                created_at: now,
                flashes: Vec::new(),
            },
        );
        token
    }

    /// Look up a live session; expired ones are dropped on access
    pub fn get(&self, token: &str, now: i64) -> Option<Session> {
        let session = self.sessions.get(token)?.value().clone();

        if is_expired(session.created_at, self.ttl, now) {
            self.sessions.remove(token);
            return None;
        }

        Some(session)
    }

    pub fn user(&self, token: &str, now: i64) -> Option<SessionUser> {
        self.get(token, now).and_then(|session| session.user)
    }

    /// Returns false if the session does not exist
    pub fn push_flash(&self, token: &str, flash: Flash) -> bool {
        match self.sessions.get_mut(token) {
            Some(mut session) => {
                session.flashes.push(flash);
                true
            }
            None => false,
        }
    }

    pub fn take_flashes(&self, token: &str) -> Vec<Flash> {
        self.sessions
            .get_mut(token)
            .map(|mut session| std::mem::take(&mut session.flashes))
            .unwrap_or_default()
    }

    /// Forget the signed-in user but keep the session for pending flashes
    pub fn sign_out(&self, token: &str) {
        if let Some(mut session) = self.sessions.get_mut(token) {
            session.user = None;
        }
    }

    pub fn remove(&self, token: &str) {
        self.sessions.remove(token);
    }

    /// Drop expired sessions, returning how many were removed
    pub fn cleanup_expired(&self, now: i64) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !is_expired(session.created_at, self.ttl, now));
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
