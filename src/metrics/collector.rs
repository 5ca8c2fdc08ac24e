use crate::stores::session_store::SessionStore;
use crate::utils::time::current_timestamp;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct Metrics {
    pub logins_succeeded: AtomicU64,
    pub logins_failed: AtomicU64,
    pub cards_issued: AtomicU64,
    pub claims_succeeded: AtomicU64,
    pub claims_rejected: AtomicU64,
    pub quizzes_passed: AtomicU64,
    pub quizzes_failed: AtomicU64,
    pub start_time: i64,
}

#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
    pub logins_succeeded: u64,
    pub logins_failed: u64,
    pub cards_issued: u64,
    pub claims_succeeded: u64,
    pub claims_rejected: u64,
    pub quizzes_passed: u64,
    pub quizzes_failed: u64,
    pub quiz_pass_rate: f64,
    pub active_sessions: usize,
    pub uptime_seconds: i64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            logins_succeeded: AtomicU64::new(0),
            logins_failed: AtomicU64::new(0),
            cards_issued: AtomicU64::new(0),
            claims_succeeded: AtomicU64::new(0),
            claims_rejected: AtomicU64::new(0),
            quizzes_passed: AtomicU64::new(0),
            quizzes_failed: AtomicU64::new(0),
            start_time: current_timestamp(),
        }
    }

    pub fn record_login(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.logins_succeeded
        } else {
            &self.logins_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_cards_issued(&self, count: usize) {
        self.cards_issued.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_claim(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.claims_succeeded
        } else {
            &self.claims_rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_quiz(&self, passed: bool) {
        let counter = if passed {
            &self.quizzes_passed
        } else {
            &self.quizzes_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self, sessions: &SessionStore) -> MetricsSnapshot {
        let quizzes_passed = self.quizzes_passed.load(Ordering::Relaxed);
        let quizzes_failed = self.quizzes_failed.load(Ordering::Relaxed);
        let quizzes_total = quizzes_passed + quizzes_failed;

        let quiz_pass_rate = if quizzes_total > 0 {
            (quizzes_passed as f64 / quizzes_total as f64) * 100.0
        } else {
            0.0
        };

        MetricsSnapshot {
            logins_succeeded: self.logins_succeeded.load(Ordering::Relaxed),
            logins_failed: self.logins_failed.load(Ordering::Relaxed),
            cards_issued: self.cards_issued.load(Ordering::Relaxed),
            claims_succeeded: self.claims_succeeded.load(Ordering::Relaxed),
            claims_rejected: self.claims_rejected.load(Ordering::Relaxed),
            quizzes_passed,
            quizzes_failed,
            quiz_pass_rate,
            active_sessions: sessions.len(),
            uptime_seconds: current_timestamp() - self.start_time,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
