use crate::models::card::Card;
use crate::models::user::User;
use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Serialize;
use std::time::Duration;

/// Users and cards stored in a hosted Postgres behind a PostgREST API
///
/// Expects two tables, `users` and `cards`, with columns named after the
/// JSON fields of [`User`] and [`Card`].
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
}

/// `None` fields serialize as `null`, which clears the column on release
#[derive(Debug, Serialize)]
struct ClaimPatch<'a> {
    holder: Option<&'a str>,
    scanned_at: Option<NaiveDateTime>,
}

impl RestStore {
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key).context("API key is not a valid header value")?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .context("API key is not a valid header value")?,
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", endpoint.trim_end_matches('/')),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        filter: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let response = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*")])
            .query(filter)
            .send()
            .await
            .context(format!("Failed to query {table}"))?;

        if !response.status().is_success() {
            bail!("Storage API returned error status for {}: {}", table, response.status());
        }

        response
            .json::<Vec<T>>()
            .await
            .context(format!("Failed to parse {table} rows"))
    }

    pub async fn list_cards(&self) -> Result<Vec<Card>> {
        self.fetch("cards", &[("order", "created_at.asc".to_string())])
            .await
    }

    pub async fn get_card(&self, serial: &str) -> Result<Option<Card>> {
        let cards: Vec<Card> = self.fetch("cards", &[("id", eq(serial))]).await?;
        Ok(cards.into_iter().next())
    }

    pub async fn insert_cards(&self, cards: &[Card]) -> Result<()> {
        if cards.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(self.table_url("cards"))
            .header("Prefer", "return=minimal")
            .json(cards)
            .send()
            .await
            .context("Failed to insert cards")?;

        if !response.status().is_success() {
            bail!("Storage API rejected card insert: {}", response.status());
        }

        Ok(())
    }

    /// Conditional update on `holder IS NULL`; an empty result means another
    /// writer got there first.
    pub async fn claim_card(
        &self,
        serial: &str,
        holder: &str,
        scanned_at: NaiveDateTime,
    ) -> Result<Option<Card>> {
        let patch = ClaimPatch {
            holder: Some(holder),
            scanned_at: Some(scanned_at),
        };

        self.patch_card(serial, "is.null".to_string(), &patch)
            .await
            .context("Failed to claim card")
    }

    /// Clear the holder, conditional on `holder` still holding the card
    pub async fn release_card(&self, serial: &str, holder: &str) -> Result<bool> {
        let patch = ClaimPatch {
            holder: None,
            scanned_at: None,
        };

        let released = self
            .patch_card(serial, eq(holder), &patch)
            .await
            .context("Failed to release card")?;

        Ok(released.is_some())
    }

    async fn patch_card(
        &self,
        serial: &str,
        holder_filter: String,
        patch: &ClaimPatch<'_>,
    ) -> Result<Option<Card>> {
        let response = self
            .client
            .patch(self.table_url("cards"))
            .query(&[("id", eq(serial)), ("holder", holder_filter)])
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Storage API rejected card update: {}", response.status());
        }

        let updated: Vec<Card> = response
            .json()
            .await
            .context("Failed to parse updated card")?;

        Ok(updated.into_iter().next())
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.fetch("users", &[("order", "username.asc".to_string())])
            .await
    }

    pub async fn get_user(&self, username: &str) -> Result<Option<User>> {
        let users: Vec<User> = self.fetch("users", &[("username", eq(username))]).await?;
        Ok(users.into_iter().next())
    }

    pub async fn put_user(&self, user: &User) -> Result<()> {
        let response = self
            .client
            .post(self.table_url("users"))
            .query(&[("on_conflict", "username")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(user)
            .send()
            .await
            .context("Failed to upsert user")?;

        if !response.status().is_success() {
            bail!(
                "Storage API rejected update for user {}: {}",
                user.username,
                response.status()
            );
        }

        Ok(())
    }
}

/// PostgREST equality filter
fn eq(value: &str) -> String {
    format!("eq.{value}")
}
