// Metrics endpoint

use crate::core::error::MonitoringError;
use crate::core::state::AppState;
use crate::models::views::ApiKeyQuery;
use crate::utils::auth::constant_time_eq;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::warn;

/// Returns JSON with the service counters:
/// - Logins succeeded/failed
/// - Cards issued, claims succeeded/rejected
/// - Quizzes passed/failed and the pass rate
/// - Active sessions and uptime
///
/// Requires valid API key for authentication.
pub async fn metrics_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ApiKeyQuery>,
) -> Result<Response, MonitoringError> {
    if !constant_time_eq(&params.api_key, &state.config.security.api_key) {
        warn!("Unauthorized metrics access attempt");
        return Err(MonitoringError::InvalidApiKey);
    }

    let snapshot = state.metrics.get_snapshot(&state.sessions);

    Ok((StatusCode::OK, Json(snapshot)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::create_test_state;
    use crate::metrics::collector::MetricsSnapshot;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn snapshot_of(response: Response) -> MetricsSnapshot {
        let (_, body) = response.into_parts();
        let bytes = Body::new(body).collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_metrics_handler_success() {
        let (state, _dir) = create_test_state().await;

        let params = ApiKeyQuery {
            api_key: "test-api-key".to_string(),
        };

        let response = metrics_handler(State(state), Query(params)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let snapshot = snapshot_of(response).await;
        assert_eq!(snapshot.logins_succeeded, 0);
        assert_eq!(snapshot.active_sessions, 0);
        assert!(snapshot.uptime_seconds >= 0);
    }

    #[tokio::test]
    async fn test_metrics_handler_invalid_api_key() {
        let (state, _dir) = create_test_state().await;

        let params = ApiKeyQuery {
            api_key: "wrong-key".to_string(),
        };

        let result = metrics_handler(State(state), Query(params)).await;
        assert!(result.is_err());
        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_metrics_handler_with_data() {
        let (state, _dir) = create_test_state().await;

        state.metrics.record_login(true);
        state.metrics.add_cards_issued(5);
        state.metrics.record_quiz(true);

        let params = ApiKeyQuery {
            api_key: "test-api-key".to_string(),
        };

        let response = metrics_handler(State(state), Query(params)).await.unwrap();
        let snapshot = snapshot_of(response).await;

        assert_eq!(snapshot.logins_succeeded, 1);
        assert_eq!(snapshot.cards_issued, 5);
        assert_eq!(snapshot.quiz_pass_rate, 100.0);
    }
}
