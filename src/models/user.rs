use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
        }
    }
}

/// Per-skill progress flags shown on the student dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillProgress {
    #[serde(default)]
    pub scanned: bool,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub quiz_taken: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    /// Stored as-is; compared in constant time at login
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub points: u64,
    /// Serials of claimed cards, append-only
    #[serde(default)]
    pub scanned_skills: Vec<String>,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub last_activity: Option<NaiveDate>,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub badges_earned: u64,
    #[serde(default)]
    pub skill_progress: BTreeMap<String, SkillProgress>,
}

impl User {
    pub fn new(username: &str, password: &str, role: Role) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            role,
            points: 0,
            scanned_skills: Vec::new(),
            streak: 0,
            last_activity: None,
            badges: Vec::new(),
            badges_earned: 0,
            skill_progress: BTreeMap::new(),
        }
    }

    /// Points only ever grow
    pub fn award_points(&mut self, amount: u64) {
        self.points = self.points.saturating_add(amount);
    }

    pub fn progress_mut(&mut self, skill_code: &str) -> &mut SkillProgress {
        self.skill_progress.entry(skill_code.to_string()).or_default()
    }
}

/// Accounts created when the user store is empty
pub fn default_users() -> Vec<User> {
    vec![
        User::new("admin", "adminpass", Role::Admin),
        User::new("student_1", "student1pass", Role::Student),
        User::new("student_2", "student2pass", Role::Student),
    ]
}
