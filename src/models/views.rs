use crate::cards::ledger::{ClaimOutcome, ClaimStatus};
use crate::models::card::Card;
use crate::models::quiz::PublicQuestion;
use crate::models::skill::Skill;
use crate::models::user::{Role, SkillProgress, User};
use crate::stores::session_store::Flash;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    pub skill: String,
    #[serde(default = "default_generate_count")]
    pub count: i64,
}

fn default_generate_count() -> i64 {
    5
}

#[derive(Debug, Deserialize)]
pub struct ValidateCardQuery {
    pub skill: Option<String>,
    pub serial: Option<String>,
}

/// Answers keyed by question index. Values are kept as raw JSON so a
/// malformed choice grades as wrong rather than failing the request.
#[derive(Debug, Deserialize)]
pub struct QuizSubmission {
    #[serde(default)]
    pub answers: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ApiKeyQuery {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct LoginView {
    pub skills: &'static [Skill],
    pub user: Option<String>,
    pub flashes: Vec<Flash>,
}

/// User row on the admin dashboard; the password is never exposed
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub username: String,
    pub role: Role,
    pub points: u64,
    pub cards_scanned: usize,
    pub streak: u32,
    pub badges_earned: u64,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role,
            points: user.points,
            cards_scanned: user.scanned_skills.len(),
            streak: user.streak,
            badges_earned: user.badges_earned,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GeneratedCard {
    pub serial: String,
    /// Link encoded in the QR code
    pub scan_url: String,
    /// Skill page without the serial
    pub view_url: String,
}

#[derive(Debug, Serialize)]
pub struct AdminView {
    pub users: Vec<UserSummary>,
    pub cards: Vec<Card>,
    pub skills: &'static [Skill],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_skill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated: Option<Vec<GeneratedCard>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub flashes: Vec<Flash>,
}

#[derive(Debug, Serialize)]
pub struct ScannedCard {
    pub serial: String,
    pub skill_code: Option<String>,
    pub title: String,
    pub scanned_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub user: String,
    pub points: u64,
    pub streak: u32,
    pub badges: usize,
    pub user_badges: Vec<String>,
    pub skills: &'static [Skill],
    pub skill_progress: BTreeMap<String, SkillProgress>,
    pub scanned_skills: Vec<ScannedCard>,
    pub flashes: Vec<Flash>,
}

#[derive(Debug, Serialize)]
pub struct SkillPageView {
    pub skill: &'static Skill,
    pub serial: Option<String>,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccessDeniedView {
    pub skill_title: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub status: ClaimStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_serial: Option<String>,
    /// Skill page to open after a successful claim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ValidateResponse {
    pub fn missing_serial() -> Self {
        Self {
            status: ClaimStatus::Invalid,
            message: "Missing serial".to_string(),
            skill: None,
            serial: None,
            existing_serial: None,
            redirect: None,
        }
    }

    pub fn from_outcome(outcome: &ClaimOutcome) -> Self {
        let card = outcome.card();
        let skill = card.map(|c| c.skill_code.clone());

        Self {
            status: outcome.status(),
            message: outcome.message(),
            redirect: match outcome {
                ClaimOutcome::Claimed(card) => Some(format!("/skills/{}", card.skill_code)),
                _ => None,
            },
            existing_serial: match outcome {
                ClaimOutcome::DuplicateSkill { existing_serial, .. } => Some(existing_serial.clone()),
                _ => None,
            },
            serial: card.map(|c| c.serial.clone()),
            skill,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuizView {
    pub skill_name: String,
    pub skill_title: String,
    pub description: String,
    pub questions: Vec<PublicQuestion>,
    pub user: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn card() -> Card {
        Card::new(
            "SCB-COM-001-AB12".to_string(),
            "communication".to_string(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        )
    }

    #[test]
    fn test_claimed_response_has_redirect() {
        let response = ValidateResponse::from_outcome(&ClaimOutcome::Claimed(card()));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["skill"], "communication");
        assert_eq!(json["serial"], "SCB-COM-001-AB12");
        assert_eq!(json["redirect"], "/skills/communication");
        assert!(json.get("existing_serial").is_none());
    }

    #[test]
    fn test_duplicate_response_names_existing_serial() {
        let outcome = ClaimOutcome::DuplicateSkill {
            card: card(),
            existing_serial: "SCB-COM-002-ZZ99".to_string(),
        };
        let json = serde_json::to_value(ValidateResponse::from_outcome(&outcome)).unwrap();

        assert_eq!(json["status"], "duplicate_skill");
        assert_eq!(json["existing_serial"], "SCB-COM-002-ZZ99");
        assert!(json.get("redirect").is_none());
    }

    #[test]
    fn test_unknown_serial_response_is_bare() {
        let json = serde_json::to_value(ValidateResponse::from_outcome(&ClaimOutcome::UnknownSerial))
            .unwrap();
        assert_eq!(json["status"], "invalid");
        assert_eq!(json["message"], "QR code is not valid.");
        assert!(json.get("serial").is_none());
    }

    #[test]
    fn test_user_summary_hides_password() {
        let user = User::new("student_1", "student1pass", Role::Student);
        let json = serde_json::to_string(&UserSummary::from(&user)).unwrap();
        assert!(!json.contains("student1pass"));
        assert!(json.contains("\"role\":\"student\""));
    }
}
