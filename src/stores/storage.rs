use crate::core::config::{StorageBackend, StorageConfig};
use crate::models::card::Card;
use crate::models::user::User;
use crate::stores::json_store::JsonFileStore;
use crate::stores::rest_store::RestStore;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;

/// Persistence port shared by every handler
///
/// Lookups are by serial for cards and by username for users. The claim
/// logic sees nothing else of the backend.
pub enum Storage {
    Json(JsonFileStore),
    Rest(RestStore),
}

impl Storage {
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        match config.backend {
            StorageBackend::Json => Ok(Storage::Json(JsonFileStore::new(config.data_dir.clone()))),
            StorageBackend::Rest => {
                let endpoint = config
                    .endpoint
                    .as_deref()
                    .context("storage.endpoint is required for the rest backend")?;
                let api_key = config
                    .api_key
                    .as_deref()
                    .context("storage.api_key is required for the rest backend")?;
                Ok(Storage::Rest(RestStore::new(endpoint, api_key)?))
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Storage::Json(_) => "json",
            Storage::Rest(_) => "rest",
        }
    }

    pub async fn list_cards(&self) -> Result<Vec<Card>> {
        match self {
            Storage::Json(store) => store.list_cards(),
            Storage::Rest(store) => store.list_cards().await,
        }
    }

    pub async fn get_card(&self, serial: &str) -> Result<Option<Card>> {
        match self {
            Storage::Json(store) => store.get_card(serial),
            Storage::Rest(store) => store.get_card(serial).await,
        }
    }

    pub async fn insert_cards(&self, cards: &[Card]) -> Result<()> {
        match self {
            Storage::Json(store) => store.insert_cards(cards),
            Storage::Rest(store) => store.insert_cards(cards).await,
        }
    }

    /// Set holder and scan time only if the card is unclaimed
    pub async fn claim_card(
        &self,
        serial: &str,
        holder: &str,
        scanned_at: NaiveDateTime,
    ) -> Result<Option<Card>> {
        match self {
            Storage::Json(store) => store.claim_card(serial, holder, scanned_at),
            Storage::Rest(store) => store.claim_card(serial, holder, scanned_at).await,
        }
    }

    /// Clear holder and scan time if `holder` still holds the card
    pub async fn release_card(&self, serial: &str, holder: &str) -> Result<bool> {
        match self {
            Storage::Json(store) => store.release_card(serial, holder),
            Storage::Rest(store) => store.release_card(serial, holder).await,
        }
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        match self {
            Storage::Json(store) => store.list_users(),
            Storage::Rest(store) => store.list_users().await,
        }
    }

    pub async fn get_user(&self, username: &str) -> Result<Option<User>> {
        match self {
            Storage::Json(store) => store.get_user(username),
            Storage::Rest(store) => store.get_user(username).await,
        }
    }

    pub async fn put_user(&self, user: &User) -> Result<()> {
        match self {
            Storage::Json(store) => store.put_user(user),
            Storage::Rest(store) => store.put_user(user).await,
        }
    }
}
