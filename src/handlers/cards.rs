use crate::core::error::CardApiError;
use crate::core::state::AppState;
use crate::handlers::current_visitor;
use crate::models::user::Role;
use crate::models::views::{ValidateCardQuery, ValidateResponse};
use crate::utils::time::utc_now;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Claim a card from the in-page scanner
///
/// GET /api/validate_card?skill=<code>&serial=<serial>
///
/// Rejections are reported in the body's `status` with a 200, except a
/// missing serial which is a 400.
pub async fn validate_card_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ValidateCardQuery>,
) -> Result<Response, CardApiError> {
    let visitor = match current_visitor(&state, &headers) {
        Some(visitor) if visitor.user.role == Role::Student => visitor,
        _ => {
            warn!("Card validation without a student session");
            return Err(CardApiError::AuthenticationRequired);
        }
    };

    let serial = match params.serial.as_deref().map(str::trim) {
        Some(serial) if !serial.is_empty() => serial,
        _ => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(ValidateResponse::missing_serial()),
            )
                .into_response())
        }
    };

    let expected_skill = params.skill.as_deref().filter(|skill| !skill.is_empty());

    let outcome = state
        .ledger
        .claim(&visitor.user.username, serial, expected_skill, utc_now())
        .await?;
    state.metrics.record_claim(outcome.is_claimed());

    debug!(
        user = %visitor.user.username,
        serial = %serial,
        status = ?outcome.status(),
        "Card validated"
    );

    Ok(Json(ValidateResponse::from_outcome(&outcome)).into_response())
}
