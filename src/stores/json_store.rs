use crate::models::card::Card;
use crate::models::user::User;
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const CARDS_FILE: &str = "cards.json";
const USERS_FILE: &str = "users.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CardsDocument {
    #[serde(default)]
    cards: Vec<Card>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UsersDocument {
    #[serde(default)]
    users: Vec<User>,
}

/// Users and cards kept as two JSON documents in a data directory
///
/// Every call re-reads the document it touches, so the files stay the single
/// source of truth. A process-wide mutex serializes all reads and writes.
pub struct JsonFileStore {
    data_dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            lock: Mutex::new(()),
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| anyhow!("JSON store lock poisoned"))
    }

    fn cards_path(&self) -> PathBuf {
        self.data_dir.join(CARDS_FILE)
    }

    fn users_path(&self) -> PathBuf {
        self.data_dir.join(USERS_FILE)
    }

    pub fn list_cards(&self) -> Result<Vec<Card>> {
        let _guard = self.guard()?;
        let doc: CardsDocument = read_document(&self.cards_path())?;
        Ok(doc.cards)
    }

    pub fn get_card(&self, serial: &str) -> Result<Option<Card>> {
        let _guard = self.guard()?;
        let doc: CardsDocument = read_document(&self.cards_path())?;
        Ok(doc.cards.into_iter().find(|card| card.serial == serial))
    }

    pub fn insert_cards(&self, cards: &[Card]) -> Result<()> {
        let _guard = self.guard()?;
        let path = self.cards_path();
        let mut doc: CardsDocument = read_document(&path)?;
        doc.cards.extend_from_slice(cards);
        write_document(&self.data_dir, &path, &doc)
    }

    /// Set the holder only if the card is still unclaimed
    ///
    /// Returns the updated card, or `None` if the card is missing or already held.
    pub fn claim_card(
        &self,
        serial: &str,
        holder: &str,
        scanned_at: NaiveDateTime,
    ) -> Result<Option<Card>> {
        let _guard = self.guard()?;
        let path = self.cards_path();
        let mut doc: CardsDocument = read_document(&path)?;

        let card = match doc
            .cards
            .iter_mut()
            .find(|card| card.serial == serial && !card.is_claimed())
        {
            Some(card) => card,
            None => return Ok(None),
        };

        card.holder = Some(holder.to_string());
        card.scanned_at = Some(scanned_at);
        let claimed = card.clone();

        write_document(&self.data_dir, &path, &doc)?;
        Ok(Some(claimed))
    }

    /// Undo a claim, but only while `holder` still holds the card
    ///
    /// Returns whether the card was released.
    pub fn release_card(&self, serial: &str, holder: &str) -> Result<bool> {
        let _guard = self.guard()?;
        let path = self.cards_path();
        let mut doc: CardsDocument = read_document(&path)?;

        let card = match doc
            .cards
            .iter_mut()
            .find(|card| card.serial == serial && card.is_held_by(holder))
        {
            Some(card) => card,
            None => return Ok(false),
        };

        card.holder = None;
        card.scanned_at = None;

        write_document(&self.data_dir, &path, &doc)?;
        Ok(true)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let _guard = self.guard()?;
        let doc: UsersDocument = read_document(&self.users_path())?;
        Ok(doc.users)
    }

    pub fn get_user(&self, username: &str) -> Result<Option<User>> {
        let _guard = self.guard()?;
        let doc: UsersDocument = read_document(&self.users_path())?;
        Ok(doc.users.into_iter().find(|user| user.username == username))
    }

    /// Insert or replace a user by username, keeping document order
    pub fn put_user(&self, user: &User) -> Result<()> {
        let _guard = self.guard()?;
        let path = self.users_path();
        let mut doc: UsersDocument = read_document(&path)?;

        match doc.users.iter_mut().find(|u| u.username == user.username) {
            Some(existing) => *existing = user.clone(),
            None => doc.users.push(user.clone()),
        }

        write_document(&self.data_dir, &path, &doc)
    }
}

/// A missing document reads as empty
fn read_document<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e).context(format!("Failed to read {}", path.display())),
    };

    serde_json::from_str(&content).context(format!("Failed to parse {}", path.display()))
}

/// Write through a temp file and rename, so readers never see a partial document
fn write_document<T: Serialize>(data_dir: &Path, path: &Path, doc: &T) -> Result<()> {
    std::fs::create_dir_all(data_dir)
        .context(format!("Failed to create data directory {}", data_dir.display()))?;

    let json = serde_json::to_string_pretty(doc).context("Failed to serialize document")?;

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json)
        .context(format!("Failed to write {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .context(format!("Failed to replace {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn card(serial: &str, skill: &str) -> Card {
        Card::new(
            serial.to_string(),
            skill.to_string(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        )
    }

    fn scanned_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_missing_files_read_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("data"));

        assert!(store.list_cards().unwrap().is_empty());
        assert!(store.list_users().unwrap().is_empty());
        assert!(store.get_card("SCB-COM-001-AAAA").unwrap().is_none());
    }

    #[test]
    fn test_insert_creates_data_dir_and_appends() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("data"));

        store.insert_cards(&[card("SCB-COM-001-AAAA", "communication")]).unwrap();
        store.insert_cards(&[card("SCB-COM-001-BBBB", "communication")]).unwrap();

        let cards = store.list_cards().unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].serial, "SCB-COM-001-AAAA");
        assert!(temp_dir.path().join("data").join("cards.json").exists());
    }

    #[test]
    fn test_claim_is_conditional_on_empty_holder() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().to_path_buf());
        store.insert_cards(&[card("SCB-CRE-001-AAAA", "creativity")]).unwrap();

        let claimed = store
            .claim_card("SCB-CRE-001-AAAA", "student_1", scanned_at())
            .unwrap()
            .unwrap();
        assert_eq!(claimed.holder.as_deref(), Some("student_1"));

        let second = store
            .claim_card("SCB-CRE-001-AAAA", "student_2", scanned_at())
            .unwrap();
        assert!(second.is_none());

        let stored = store.get_card("SCB-CRE-001-AAAA").unwrap().unwrap();
        assert_eq!(stored.holder.as_deref(), Some("student_1"));
    }

    #[test]
    fn test_release_only_by_current_holder() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().to_path_buf());
        store.insert_cards(&[card("SCB-CRE-001-AAAA", "creativity")]).unwrap();
        store
            .claim_card("SCB-CRE-001-AAAA", "student_1", scanned_at())
            .unwrap();

        assert!(!store.release_card("SCB-CRE-001-AAAA", "student_2").unwrap());
        assert!(store.release_card("SCB-CRE-001-AAAA", "student_1").unwrap());

        let stored = store.get_card("SCB-CRE-001-AAAA").unwrap().unwrap();
        assert!(stored.holder.is_none());
        assert!(stored.scanned_at.is_none());
        assert!(!store.release_card("SCB-CRE-001-AAAA", "student_1").unwrap());
    }

    #[test]
    fn test_claim_unknown_serial() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().to_path_buf());
        assert!(store
            .claim_card("SCB-XXX-001-0000", "student_1", scanned_at())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_put_user_upserts() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().to_path_buf());

        let mut user = User::new("student_1", "pw", Role::Student);
        store.put_user(&user).unwrap();
        store.put_user(&User::new("admin", "pw", Role::Admin)).unwrap();

        user.award_points(10);
        store.put_user(&user).unwrap();

        let users = store.list_users().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "student_1");
        assert_eq!(store.get_user("student_1").unwrap().unwrap().points, 10);
    }

    #[test]
    fn test_reads_documents_written_elsewhere() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("users.json"),
            r#"{"users": [{"username": "admin", "password": "adminpass", "role": "admin", "scanned_skills": []}]}"#,
        )
        .unwrap();

        let store = JsonFileStore::new(temp_dir.path().to_path_buf());
        let admin = store.get_user("admin").unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
    }

    #[test]
    fn test_corrupt_document_is_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("cards.json"), "[oops").unwrap();

        let store = JsonFileStore::new(temp_dir.path().to_path_buf());
        assert!(store.list_cards().is_err());
    }
}
