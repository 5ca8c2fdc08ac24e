use crate::cards::issuer::issue_batch;
use crate::core::error::PageError;
use crate::core::state::AppState;
use crate::handlers::{require_role, take_flashes};
use crate::models::card::Card;
use crate::models::skill::{find_skill, SKILLS};
use crate::models::user::Role;
use crate::models::views::{AdminView, GenerateForm, GeneratedCard, UserSummary};
use crate::utils::time::today;
use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
    Form,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// GET /admin
pub async fn admin_dashboard_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AdminView>, PageError> {
    require_role(&state, &headers, Role::Admin)?;

    let view = admin_view(&state, &headers).await?;
    Ok(Json(view))
}

/// Generate a batch of cards for one skill
///
/// POST /admin/generate
///
/// A failed insert is reported in the view's `error` field rather than as an
/// error response.
pub async fn admin_generate_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<GenerateForm>,
) -> Result<Json<AdminView>, PageError> {
    let admin = require_role(&state, &headers, Role::Admin)?;

    let skill = find_skill(&form.skill).ok_or_else(|| {
        warn!(skill = %form.skill, "Generate requested for unknown skill");
        PageError::InvalidParameter(format!("unknown skill '{}'", form.skill))
    })?;

    let max_batch_size = state.config.cards.max_batch_size;
    if form.count > max_batch_size {
        warn!(count = form.count, max_batch_size, "Batch size over limit");
        return Err(PageError::InvalidParameter(format!(
            "count must be at most {max_batch_size}"
        )));
    }

    let cards = issue_batch(skill.code, form.count, today(), &mut rand::rng());

    let mut insert_error = None;
    if !cards.is_empty() {
        if let Err(e) = state.storage.insert_cards(&cards).await {
            error!(error = %e, skill = %skill.code, count = cards.len(), "Failed to save generated cards");
            insert_error = Some(format!("Failed to save cards: {e}"));
        }
    }

    let generated = if insert_error.is_none() {
        state.metrics.add_cards_issued(cards.len());
        info!(
            admin = %admin.user.username,
            skill = %skill.code,
            count = cards.len(),
            "Cards generated"
        );
        Some(card_links(&state.config.server.public_url, &cards))
    } else {
        None
    };

    let mut view = admin_view(&state, &headers).await?;
    view.chosen_skill = Some(skill.code.to_string());
    view.generated = generated;
    view.error = insert_error;

    Ok(Json(view))
}

async fn admin_view(state: &AppState, headers: &HeaderMap) -> Result<AdminView, PageError> {
    let users = state.storage.list_users().await?;
    let cards = state.storage.list_cards().await?;

    Ok(AdminView {
        users: users.iter().map(UserSummary::from).collect(),
        cards,
        skills: SKILLS,
        chosen_skill: None,
        generated: None,
        error: None,
        flashes: take_flashes(state, headers),
    })
}

fn card_links(public_url: &str, cards: &[Card]) -> Vec<GeneratedCard> {
    let base = public_url.trim_end_matches('/');

    cards
        .iter()
        .map(|card| GeneratedCard {
            serial: card.serial.clone(),
            scan_url: format!("{base}/skills/{}/{}", card.skill_code, card.serial),
            view_url: format!("{base}/skills/{}", card.skill_code),
        })
        .collect()
}
