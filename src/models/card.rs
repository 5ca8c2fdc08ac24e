use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A physical QR card tied to one skill
///
/// Field names on the wire follow the persisted documents (`id`, `skill_name`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(rename = "id")]
    pub serial: String,
    #[serde(rename = "skill_name")]
    pub skill_code: String,
    pub created_at: NaiveDate,
    #[serde(default)]
    pub holder: Option<String>,
    #[serde(default)]
    pub scanned_at: Option<NaiveDateTime>,
}

impl Card {
    pub fn new(serial: String, skill_code: String, created_at: NaiveDate) -> Self {
        Self {
            serial,
            skill_code,
            created_at,
            holder: None,
            scanned_at: None,
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.holder.is_some()
    }

    pub fn is_held_by(&self, username: &str) -> bool {
        self.holder.as_deref() == Some(username)
    }
}
