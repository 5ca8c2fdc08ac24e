use crate::core::error::{PageError, QuizError};
use crate::core::state::AppState;
use crate::handlers::current_visitor;
use crate::models::quiz::QuizBank;
use crate::models::skill::skill_title;
use crate::models::views::{QuizSubmission, QuizView};
use crate::rewards::badges;
use crate::rewards::quiz::{grade, QuizResult};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Quiz for a skill, answer keys stripped
///
/// GET /quiz/{skill}
pub async fn quiz_page_handler(
    State(state): State<Arc<AppState>>,
    Path(skill): Path<String>,
    headers: HeaderMap,
) -> Result<Json<QuizView>, PageError> {
    let visitor = current_visitor(&state, &headers).ok_or(PageError::LoginRequired)?;

    let bank = QuizBank::load(&state.questions_path())?
        .ok_or_else(|| PageError::NotFound("quiz questions".to_string()))?;
    let quiz = bank
        .get(&skill)
        .ok_or_else(|| PageError::NotFound(format!("quiz for '{skill}'")))?;

    Ok(Json(QuizView {
        skill_title: skill_title(&skill),
        skill_name: skill,
        description: quiz.description.clone(),
        questions: quiz.public_questions(),
        user: visitor.user.username,
    }))
}

/// Grade a submission and award points on a pass
///
/// POST /submit_quiz/{skill}
pub async fn submit_quiz_handler(
    State(state): State<Arc<AppState>>,
    Path(skill): Path<String>,
    headers: HeaderMap,
    Json(submission): Json<QuizSubmission>,
) -> Result<Json<QuizResult>, QuizError> {
    let visitor = current_visitor(&state, &headers).ok_or(QuizError::LoginRequired)?;
    let username = visitor.user.username.as_str();

    let bank = QuizBank::load(&state.questions_path())?.ok_or_else(|| {
        warn!(path = %state.questions_path().display(), "Question bank missing");
        QuizError::QuestionsUnavailable
    })?;
    let quiz = bank.get(&skill).ok_or(QuizError::QuizNotFound)?;

    let result = grade(quiz, &submission.answers);
    state.metrics.record_quiz(result.passed);

    if result.passed {
        let points = result.points_earned;
        let updated = state
            .ledger
            .update_user(username, |user| {
                user.award_points(points);
                user.progress_mut(&skill).quiz_taken = true;
                badges::refresh(user);
                user.points
            })
            .await?;

        if let Some((_, total_points)) = updated {
            info!(
                user = %username,
                skill = %skill,
                score = result.score,
                total = result.total,
                points = total_points,
                "Quiz passed"
            );
        }
    } else {
        info!(
            user = %username,
            skill = %skill,
            score = result.score,
            total = result.total,
            "Quiz failed"
        );
    }

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{create_test_state, signed_in};
    use crate::models::user::Role;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::collections::HashMap;

    fn answers(pairs: &[(&str, usize)]) -> Json<QuizSubmission> {
        Json(QuizSubmission {
            answers: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
                .collect::<HashMap<_, _>>(),
        })
    }

    #[tokio::test]
    async fn test_quiz_page_hides_answers() {
        let (state, _dir) = create_test_state().await;
        let headers = signed_in(&state, "student_1", Role::Student);

        let Json(view) = quiz_page_handler(State(state), Path("creativity".to_string()), headers)
            .await
            .unwrap();

        assert_eq!(view.skill_title, "Creativity");
        assert_eq!(view.questions.len(), 3);

        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("correct"));
    }

    #[tokio::test]
    async fn test_quiz_page_requires_login() {
        let (state, _dir) = create_test_state().await;

        let result = quiz_page_handler(State(state), Path("creativity".to_string()), HeaderMap::new()).await;
        assert!(matches!(result, Err(PageError::LoginRequired)));
    }

    #[tokio::test]
    async fn test_passing_quiz_awards_points_without_badge() {
        let (state, _dir) = create_test_state().await;
        let headers = signed_in(&state, "student_1", Role::Student);

        let Json(result) = submit_quiz_handler(
            State(Arc::clone(&state)),
            Path("creativity".to_string()),
            headers,
            answers(&[("0", 0), ("1", 1), ("2", 2)]),
        )
        .await
        .unwrap();

        assert_eq!(result.score, 3);
        assert!(result.passed);
        assert_eq!(result.points_earned, 20);

        let user = state.storage.get_user("student_1").await.unwrap().unwrap();
        assert_eq!(user.points, 20);
        assert_eq!(user.badges_earned, 0);
        assert!(user.skill_progress["creativity"].quiz_taken);
    }

    #[tokio::test]
    async fn test_pass_crossing_fifty_points_grants_badge() {
        let (state, _dir) = create_test_state().await;
        state
            .ledger
            .update_user("student_1", |user| user.points = 40)
            .await
            .unwrap();
        let headers = signed_in(&state, "student_1", Role::Student);

        submit_quiz_handler(
            State(Arc::clone(&state)),
            Path("creativity".to_string()),
            headers,
            answers(&[("0", 0), ("1", 1), ("2", 2)]),
        )
        .await
        .unwrap();

        let user = state.storage.get_user("student_1").await.unwrap().unwrap();
        assert_eq!(user.points, 60);
        assert_eq!(user.badges_earned, 1);
    }

    #[tokio::test]
    async fn test_failing_quiz_changes_nothing() {
        let (state, _dir) = create_test_state().await;
        let headers = signed_in(&state, "student_1", Role::Student);

        // 2 of 3 is below the threshold
        let Json(result) = submit_quiz_handler(
            State(Arc::clone(&state)),
            Path("creativity".to_string()),
            headers,
            answers(&[("0", 0), ("1", 1), ("2", 0)]),
        )
        .await
        .unwrap();

        assert_eq!(result.score, 2);
        assert!(!result.passed);
        assert_eq!(result.points_earned, 0);

        let user = state.storage.get_user("student_1").await.unwrap().unwrap();
        assert_eq!(user.points, 0);
        assert!(!user.skill_progress.contains_key("creativity"));
        assert_eq!(state.metrics.get_snapshot(&state.sessions).quizzes_failed, 1);
    }

    #[tokio::test]
    async fn test_malformed_answers_grade_as_wrong() {
        let (state, _dir) = create_test_state().await;
        let headers = signed_in(&state, "student_1", Role::Student);
        let submission: QuizSubmission =
            serde_json::from_str(r#"{"answers": {"0": 0, "1": null, "2": "2"}}"#).unwrap();

        let Json(result) = submit_quiz_handler(
            State(Arc::clone(&state)),
            Path("creativity".to_string()),
            headers.clone(),
            Json(submission),
        )
        .await
        .unwrap();
        assert_eq!(result.score, 1);
        assert!(!result.passed);

        let submission: QuizSubmission =
            serde_json::from_str(r#"{"answers": {"0": -1, "1": 1.5, "2": [2]}}"#).unwrap();
        let Json(result) = submit_quiz_handler(
            State(Arc::clone(&state)),
            Path("creativity".to_string()),
            headers,
            Json(submission),
        )
        .await
        .unwrap();
        assert_eq!(result.score, 0);

        let user = state.storage.get_user("student_1").await.unwrap().unwrap();
        assert_eq!(user.points, 0);
    }

    #[tokio::test]
    async fn test_submission_without_answers_scores_zero() {
        let (state, _dir) = create_test_state().await;
        let headers = signed_in(&state, "student_1", Role::Student);
        let submission: QuizSubmission = serde_json::from_str("{}").unwrap();

        let Json(result) = submit_quiz_handler(
            State(state),
            Path("creativity".to_string()),
            headers,
            Json(submission),
        )
        .await
        .unwrap();
        assert_eq!(result.score, 0);
        assert_eq!(result.total, 3);
    }

    #[tokio::test]
    async fn test_submit_errors() {
        let (state, dir) = create_test_state().await;

        let result = submit_quiz_handler(
            State(Arc::clone(&state)),
            Path("creativity".to_string()),
            HeaderMap::new(),
            answers(&[]),
        )
        .await;
        assert_eq!(result.unwrap_err().into_response().status(), StatusCode::FORBIDDEN);

        let headers = signed_in(&state, "student_1", Role::Student);
        let result = submit_quiz_handler(
            State(Arc::clone(&state)),
            Path("leadership".to_string()),
            headers.clone(),
            answers(&[]),
        )
        .await;
        assert!(matches!(result, Err(QuizError::QuizNotFound)));

        std::fs::remove_file(dir.path().join("questions.json")).unwrap();
        let result = submit_quiz_handler(
            State(state),
            Path("creativity".to_string()),
            headers,
            answers(&[]),
        )
        .await;
        assert!(matches!(result, Err(QuizError::QuestionsUnavailable)));
    }
}
