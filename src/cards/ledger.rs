use crate::models::card::Card;
use crate::models::user::User;
use crate::stores::storage::Storage;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Points awarded for claiming a card
pub const SCAN_POINTS: u64 = 10;

/// Status values reported by the card validation API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Ok,
    Invalid,
    Claimed,
    AlreadyScanned,
    DuplicateSkill,
}

/// Result of a claim attempt
///
/// Every variant except `Claimed` is terminal and leaves the card and the
/// user untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    Claimed(Card),
    UnknownSerial,
    AlreadyScanned(Card),
    HeldByOther { card: Card, holder: String },
    SkillMismatch(Card),
    DuplicateSkill { card: Card, existing_serial: String },
}

impl ClaimOutcome {
    pub fn status(&self) -> ClaimStatus {
        match self {
            ClaimOutcome::Claimed(_) => ClaimStatus::Ok,
            ClaimOutcome::UnknownSerial | ClaimOutcome::SkillMismatch(_) => ClaimStatus::Invalid,
            ClaimOutcome::AlreadyScanned(_) => ClaimStatus::AlreadyScanned,
            ClaimOutcome::HeldByOther { .. } => ClaimStatus::Claimed,
            ClaimOutcome::DuplicateSkill { .. } => ClaimStatus::DuplicateSkill,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ClaimOutcome::Claimed(_) => "QR code claimed. Redirecting...".to_string(),
            ClaimOutcome::UnknownSerial => "QR code is not valid.".to_string(),
            ClaimOutcome::AlreadyScanned(_) => "You already scanned this card.".to_string(),
            ClaimOutcome::HeldByOther { holder, .. } => {
                format!("This card was already claimed by {holder}.")
            }
            ClaimOutcome::SkillMismatch(_) => "Skill does not match QR code.".to_string(),
            ClaimOutcome::DuplicateSkill { .. } => {
                "You already have this skill from another card.".to_string()
            }
        }
    }

    pub fn card(&self) -> Option<&Card> {
        match self {
            ClaimOutcome::UnknownSerial => None,
            ClaimOutcome::Claimed(card)
            | ClaimOutcome::AlreadyScanned(card)
            | ClaimOutcome::SkillMismatch(card)
            | ClaimOutcome::HeldByOther { card, .. }
            | ClaimOutcome::DuplicateSkill { card, .. } => Some(card),
        }
    }

    pub fn is_claimed(&self) -> bool {
        matches!(self, ClaimOutcome::Claimed(_))
    }
}

/// Owns every mutation of cards and users
///
/// Writers are serialized by a single async mutex, and the card update itself
/// is conditional on the card still being unclaimed. A claim whose user write
/// fails is released again before the error is returned.
pub struct ClaimLedger {
    storage: Arc<Storage>,
    writer: Mutex<()>,
}

impl ClaimLedger {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            writer: Mutex::new(()),
        }
    }

    /// Try to hand `serial` to `username`
    ///
    /// `expected_skill` is the skill the student was scanning for, if known.
    pub async fn claim(
        &self,
        username: &str,
        serial: &str,
        expected_skill: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<ClaimOutcome> {
        let _writer = self.writer.lock().await;

        let card = match self.storage.get_card(serial).await? {
            Some(card) => card,
            None => {
                debug!(serial = %serial, user = %username, "Unknown serial");
                return Ok(ClaimOutcome::UnknownSerial);
            }
        };

        if let Some(outcome) = held_outcome(&card, username) {
            return Ok(outcome);
        }

        if let Some(skill) = expected_skill {
            if skill != card.skill_code {
                return Ok(ClaimOutcome::SkillMismatch(card));
            }
        }

        let mut user = self
            .storage
            .get_user(username)
            .await?
            .context(format!("User {username} not found"))?;

        for existing in user.scanned_skills.iter().filter(|s| s.as_str() != serial) {
            if let Some(other) = self.storage.get_card(existing).await? {
                if other.skill_code == card.skill_code {
                    return Ok(ClaimOutcome::DuplicateSkill {
                        card,
                        existing_serial: existing.clone(),
                    });
                }
            }
        }

        let claimed = match self.storage.claim_card(serial, username, now).await? {
            Some(claimed) => claimed,
            None => {
                // Lost to a writer outside this process
                warn!(serial = %serial, user = %username, "Conditional claim failed");
                let current = self
                    .storage
                    .get_card(serial)
                    .await?
                    .context(format!("Card {serial} disappeared during claim"))?;
                return Ok(held_outcome(&current, username)
                    .unwrap_or(ClaimOutcome::UnknownSerial));
            }
        };

        user.scanned_skills.push(serial.to_string());
        user.progress_mut(&claimed.skill_code).scanned = true;
        user.award_points(SCAN_POINTS);

        if let Err(e) = self.storage.put_user(&user).await {
            // The card must not stay held by a user who never got it
            match self.storage.release_card(serial, username).await {
                Ok(released) => {
                    warn!(serial = %serial, user = %username, released, "Claim rolled back")
                }
                Err(release_error) => error!(
                    serial = %serial,
                    user = %username,
                    error = %release_error,
                    "Failed to roll back claim"
                ),
            }
            return Err(e.context(format!("Failed to record claim of {serial} for {username}")));
        }

        info!(
            serial = %serial,
            user = %username,
            skill = %claimed.skill_code,
            points = user.points,
            "Card claimed"
        );

        Ok(ClaimOutcome::Claimed(claimed))
    }

    /// A skill is unlocked once the user holds any card for it
    pub async fn has_access(&self, username: &str, skill_code: &str) -> Result<bool> {
        let user = match self.storage.get_user(username).await? {
            Some(user) => user,
            None => return Ok(false),
        };

        for serial in &user.scanned_skills {
            if let Some(card) = self.storage.get_card(serial).await? {
                if card.skill_code == skill_code {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    /// Apply a change to a user under the writer lock and persist it
    ///
    /// Returns `None` if the user does not exist.
    pub async fn update_user<F, T>(&self, username: &str, change: F) -> Result<Option<(User, T)>>
    where
        F: FnOnce(&mut User) -> T,
    {
        let _writer = self.writer.lock().await;

        let mut user = match self.storage.get_user(username).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        let result = change(&mut user);
        self.storage.put_user(&user).await?;

        Ok(Some((user, result)))
    }
}

fn held_outcome(card: &Card, username: &str) -> Option<ClaimOutcome> {
    if card.is_held_by(username) {
        return Some(ClaimOutcome::AlreadyScanned(card.clone()));
    }

    card.holder.as_ref().map(|holder| ClaimOutcome::HeldByOther {
        card: card.clone(),
        holder: holder.clone(),
    })
}
