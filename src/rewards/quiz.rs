use crate::models::quiz::Quiz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const PASS_THRESHOLD_PERCENT: usize = 70;
pub const QUIZ_PASS_POINTS: u64 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub score: usize,
    pub total: usize,
    pub percentage: f64,
    pub passed: bool,
    pub points_earned: u64,
}

/// Grade answers keyed by question index (as a string)
///
/// Only an integer equal to the correct option counts. The pass check is done
/// in integers so 7 of 10 passes exactly. An empty quiz never passes.
pub fn grade(quiz: &Quiz, answers: &HashMap<String, Value>) -> QuizResult {
    let total = quiz.questions.len();
    let score = quiz
        .questions
        .iter()
        .enumerate()
        .filter(|(index, question)| {
            answers
                .get(&index.to_string())
                .and_then(Value::as_u64)
                .is_some_and(|choice| choice == question.correct as u64)
        })
        .count();

    let percentage = if total > 0 {
        score as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    let passed = total > 0 && score * 100 >= total * PASS_THRESHOLD_PERCENT;

    QuizResult {
        score,
        total,
        percentage,
        passed,
        points_earned: if passed { QUIZ_PASS_POINTS } else { 0 },
    }
}
