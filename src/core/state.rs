// Application state (AppState)

use crate::cards::ledger::ClaimLedger;
use crate::core::config::Config;
use crate::metrics::collector::Metrics;
use crate::security::login_throttle::LoginThrottle;
use crate::stores::session_store::SessionStore;
use crate::stores::storage::Storage;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state
///
/// Contains all shared components that are accessed by request handlers.
/// All fields are wrapped in Arc for efficient cloning across threads.
#[derive(Clone)]
pub struct AppState {
    /// Persistence port for users and cards
    pub storage: Arc<Storage>,

    /// Serializes claims and every other user mutation
    pub ledger: Arc<ClaimLedger>,

    /// Signed-in and anonymous (flash-only) sessions
    pub sessions: Arc<SessionStore>,

    /// Failed login counter per client IP
    pub login_throttle: Arc<LoginThrottle>,

    pub metrics: Arc<Metrics>,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, storage: Storage) -> Self {
        let config = Arc::new(config);
        let storage = Arc::new(storage);

        Self {
            ledger: Arc::new(ClaimLedger::new(Arc::clone(&storage))),
            storage,
            sessions: Arc::new(SessionStore::new(config.security.session_ttl)),
            login_throttle: Arc::new(LoginThrottle::new(
                config.security.max_login_attempts_per_minute,
            )),
            metrics: Arc::new(Metrics::new()),
            config,
        }
    }

    /// Quiz bank lives next to the JSON documents regardless of backend
    pub fn questions_path(&self) -> PathBuf {
        self.config.storage.data_dir.join("questions.json")
    }
}
