use anyhow::{Context, Result};
use tracing::info;

use crate::models::user::default_users;
use crate::stores::storage::Storage;

/// Create the default accounts when the user store is empty
///
/// Returns the number of users created.
pub async fn seed_default_users(storage: &Storage) -> Result<usize> {
    let existing = storage
        .list_users()
        .await
        .context("Failed to list users during bootstrap")?;

    if !existing.is_empty() {
        info!(users = existing.len(), "User store already populated");
        return Ok(0);
    }

    let users = default_users();
    for user in &users {
        storage
            .put_user(user)
            .await
            .context(format!("Failed to seed user {}", user.username))?;
    }

    info!(users = users.len(), "Seeded default users");

    Ok(users.len())
}
