use crate::cards::ledger::ClaimOutcome;
use crate::core::error::PageError;
use crate::core::state::AppState;
use crate::handlers::{flash_redirect, require_role, Visitor};
use crate::models::skill::{find_skill, Skill};
use crate::models::user::Role;
use crate::models::views::{AccessDeniedView, SkillPageView};
use crate::stores::session_store::Flash;
use crate::utils::time::utc_now;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{debug, info};

/// GET /skills/{skill}
pub async fn skill_page_handler(
    State(state): State<Arc<AppState>>,
    Path(skill): Path<String>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let visitor = require_role(&state, &headers, Role::Student)?;
    let skill = catalog_skill(&skill)?;

    render_skill(&state, &visitor, skill, None, None).await
}

/// Scan landing page: claim the card, then show the skill
///
/// GET /skills/{skill}/{serial}
pub async fn skill_page_with_serial_handler(
    State(state): State<Arc<AppState>>,
    Path((skill, serial)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let visitor = require_role(&state, &headers, Role::Student)?;
    let skill = catalog_skill(&skill)?;
    let username = visitor.user.username.as_str();

    let outcome = state
        .ledger
        .claim(username, &serial, Some(skill.code), utc_now())
        .await?;
    state.metrics.record_claim(outcome.is_claimed());

    let notice = match &outcome {
        ClaimOutcome::Claimed(_) => {
            state
                .sessions
                .push_flash(&visitor.token, Flash::success("Skill scanned and points awarded!"));
            None
        }
        ClaimOutcome::AlreadyScanned(_) => None,
        ClaimOutcome::DuplicateSkill { .. } => Some(outcome.message()),
        _ => {
            info!(
                user = %username,
                serial = %serial,
                status = ?outcome.status(),
                "Scan rejected"
            );
            return Ok(flash_redirect(
                &state,
                &headers,
                Flash::error(outcome.message()),
                "/student",
            ));
        }
    };

    render_skill(&state, &visitor, skill, Some(serial), notice).await
}

fn catalog_skill(code: &str) -> Result<&'static Skill, PageError> {
    find_skill(code).ok_or_else(|| PageError::NotFound(format!("skill '{code}'")))
}

async fn render_skill(
    state: &AppState,
    visitor: &Visitor,
    skill: &'static Skill,
    serial: Option<String>,
    notice: Option<String>,
) -> Result<Response, PageError> {
    let username = visitor.user.username.as_str();

    if !state.ledger.has_access(username, skill.code).await? {
        debug!(user = %username, skill = %skill.code, "Skill locked");
        return Ok((
            StatusCode::FORBIDDEN,
            Json(AccessDeniedView {
                skill_title: skill.title.to_string(),
                message: "Scan a card for this skill to unlock it.".to_string(),
            }),
        )
            .into_response());
    }

    state
        .ledger
        .update_user(username, |user| user.progress_mut(skill.code).read = true)
        .await?;

    Ok(Json(SkillPageView {
        skill,
        serial,
        user: username.to_string(),
        notice,
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{body_json, create_test_state, location, signed_in};
    use crate::handlers::take_flashes;

    #[tokio::test]
    async fn test_scan_claims_card_and_opens_skill() {
        let (state, _dir) = create_test_state().await;
        let headers = signed_in(&state, "student_1", Role::Student);

        let response = skill_page_with_serial_handler(
            State(Arc::clone(&state)),
            Path(("communication".to_string(), "SCB-COM-001-AAAA".to_string())),
            headers.clone(),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            take_flashes(&state, &headers),
            vec![Flash::success("Skill scanned and points awarded!")]
        );
        let view = body_json(response).await;
        assert_eq!(view["skill"]["code"], "communication");
        assert_eq!(view["serial"], "SCB-COM-001-AAAA");
        assert!(view.get("notice").is_none());

        let user = state.storage.get_user("student_1").await.unwrap().unwrap();
        assert_eq!(user.points, 10);
        assert_eq!(user.scanned_skills, vec!["SCB-COM-001-AAAA".to_string()]);
        assert!(user.skill_progress["communication"].scanned);
        assert!(user.skill_progress["communication"].read);

        let card = state.storage.get_card("SCB-COM-001-AAAA").await.unwrap().unwrap();
        assert_eq!(card.holder.as_deref(), Some("student_1"));
        assert_eq!(state.metrics.get_snapshot(&state.sessions).claims_succeeded, 1);
    }

    #[tokio::test]
    async fn test_rescan_by_holder_shows_page_without_points() {
        let (state, _dir) = create_test_state().await;
        let headers = signed_in(&state, "student_1", Role::Student);
        let path = || Path(("communication".to_string(), "SCB-COM-001-AAAA".to_string()));

        skill_page_with_serial_handler(State(Arc::clone(&state)), path(), headers.clone())
            .await
            .unwrap();
        take_flashes(&state, &headers);

        let response = skill_page_with_serial_handler(State(Arc::clone(&state)), path(), headers.clone())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(take_flashes(&state, &headers).is_empty());
        let user = state.storage.get_user("student_1").await.unwrap().unwrap();
        assert_eq!(user.points, 10);
    }

    #[tokio::test]
    async fn test_card_held_by_other_flashes_and_redirects() {
        let (state, _dir) = create_test_state().await;
        state
            .ledger
            .claim("student_2", "SCB-COM-001-AAAA", None, utc_now())
            .await
            .unwrap();

        let headers = signed_in(&state, "student_1", Role::Student);
        let response = skill_page_with_serial_handler(
            State(Arc::clone(&state)),
            Path(("communication".to_string(), "SCB-COM-001-AAAA".to_string())),
            headers.clone(),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/student");

        let flashes = take_flashes(&state, &headers);
        assert_eq!(flashes, vec![Flash::error("This card was already claimed by student_2.")]);

        let user = state.storage.get_user("student_1").await.unwrap().unwrap();
        assert_eq!(user.points, 0);
    }

    #[tokio::test]
    async fn test_serial_for_another_skill_is_rejected() {
        let (state, _dir) = create_test_state().await;
        let headers = signed_in(&state, "student_1", Role::Student);

        let response = skill_page_with_serial_handler(
            State(Arc::clone(&state)),
            Path(("communication".to_string(), "SCB-CRE-001-CCCC".to_string())),
            headers,
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let card = state.storage.get_card("SCB-CRE-001-CCCC").await.unwrap().unwrap();
        assert!(card.holder.is_none());
    }

    #[tokio::test]
    async fn test_second_card_of_same_skill_shows_notice() {
        let (state, _dir) = create_test_state().await;
        let headers = signed_in(&state, "student_1", Role::Student);

        skill_page_with_serial_handler(
            State(Arc::clone(&state)),
            Path(("communication".to_string(), "SCB-COM-001-AAAA".to_string())),
            headers.clone(),
        )
        .await
        .unwrap();

        let response = skill_page_with_serial_handler(
            State(Arc::clone(&state)),
            Path(("communication".to_string(), "SCB-COM-002-BBBB".to_string())),
            headers,
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let view = body_json(response).await;
        assert_eq!(view["notice"], "You already have this skill from another card.");

        let card = state.storage.get_card("SCB-COM-002-BBBB").await.unwrap().unwrap();
        assert!(card.holder.is_none());
    }

    #[tokio::test]
    async fn test_locked_skill_is_access_denied() {
        let (state, _dir) = create_test_state().await;
        let headers = signed_in(&state, "student_1", Role::Student);

        let response = skill_page_handler(State(Arc::clone(&state)), Path("creativity".to_string()), headers)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let view = body_json(response).await;
        assert_eq!(view["skill_title"], "Creativity");

        let user = state.storage.get_user("student_1").await.unwrap().unwrap();
        assert!(!user.skill_progress.contains_key("creativity"));
    }

    #[tokio::test]
    async fn test_unknown_skill_is_not_found() {
        let (state, _dir) = create_test_state().await;
        let headers = signed_in(&state, "student_1", Role::Student);

        let result = skill_page_handler(State(state), Path("juggling".to_string()), headers).await;
        assert!(matches!(result, Err(PageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_anonymous_scan_redirects_to_login() {
        let (state, _dir) = create_test_state().await;

        let result = skill_page_with_serial_handler(
            State(Arc::clone(&state)),
            Path(("communication".to_string(), "SCB-COM-001-AAAA".to_string())),
            HeaderMap::new(),
        )
        .await;

        assert!(matches!(result, Err(PageError::LoginRequired)));
        let card = state.storage.get_card("SCB-COM-001-AAAA").await.unwrap().unwrap();
        assert!(card.holder.is_none());
    }
}
