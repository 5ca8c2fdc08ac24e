use crate::core::error::PageError;
use crate::core::state::AppState;
use crate::handlers::{require_role, take_flashes};
use crate::models::card::Card;
use crate::models::skill::{skill_title, SKILLS};
use crate::models::user::{Role, User};
use crate::models::views::{DashboardView, ScannedCard};
use crate::rewards::{badges, streak};
use crate::utils::time::today;
use axum::{extract::State, http::HeaderMap, response::Json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Student dashboard
///
/// GET /student
///
/// Each visit updates the daily streak, grants badges covered by the
/// current points and fills in progress for every catalog skill.
pub async fn student_dashboard_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DashboardView>, PageError> {
    let visitor = require_role(&state, &headers, Role::Student)?;
    let username = visitor.user.username.as_str();

    let cards: HashMap<String, Card> = state
        .storage
        .list_cards()
        .await?
        .into_iter()
        .map(|card| (card.serial.clone(), card))
        .collect();

    let updated = state
        .ledger
        .update_user(username, |user| {
            streak::record_visit(user, today());
            let new_badge = badges::refresh(user);
            sync_progress(user, &cards);
            new_badge
        })
        .await?;

    let (user, new_badge) = match updated {
        Some(updated) => updated,
        None => {
            warn!(user = %username, "Session refers to a missing user");
            state.sessions.sign_out(&visitor.token);
            return Err(PageError::LoginRequired);
        }
    };

    if new_badge {
        info!(user = %username, badges = user.badges_earned, "Badge earned");
    }
    debug!(user = %username, streak = user.streak, points = user.points, "Dashboard visit");

    let scanned_skills = user
        .scanned_skills
        .iter()
        .map(|serial| scanned_card(serial, cards.get(serial)))
        .collect();

    Ok(Json(DashboardView {
        user: user.username.clone(),
        points: user.points,
        streak: user.streak,
        badges: user.badges.len(),
        user_badges: user.badges.clone(),
        skills: SKILLS,
        skill_progress: user.skill_progress.clone(),
        scanned_skills,
        flashes: take_flashes(&state, &headers),
    }))
}

/// Ensure an entry per catalog skill and mark skills held through cards
fn sync_progress(user: &mut User, cards: &HashMap<String, Card>) {
    for skill in SKILLS {
        user.progress_mut(skill.code);
    }

    let held: Vec<String> = user
        .scanned_skills
        .iter()
        .filter_map(|serial| cards.get(serial))
        .map(|card| card.skill_code.clone())
        .collect();

    for skill_code in held {
        user.progress_mut(&skill_code).scanned = true;
    }
}

fn scanned_card(serial: &str, card: Option<&Card>) -> ScannedCard {
    match card {
        Some(card) => ScannedCard {
            serial: serial.to_string(),
            skill_code: Some(card.skill_code.clone()),
            title: skill_title(&card.skill_code),
            scanned_at: card.scanned_at,
        },
        None => ScannedCard {
            serial: serial.to_string(),
            skill_code: None,
            title: serial.to_string(),
            scanned_at: None,
        },
    }
}
