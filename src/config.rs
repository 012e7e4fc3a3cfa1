// src/config.rs

use std::env;

use dotenvy::dotenv;

use crate::engine::session::TimerSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub rust_log: String,
    /// Per-question deliberation budget in seconds.
    pub question_seconds: u64,
    /// How long correctness feedback stays on screen before auto-advance.
    pub feedback_seconds: u64,
    /// Attempt size drawn from the question bank.
    pub questions_per_attempt: usize,
    /// Wall-clock milliseconds per engine tick. 1000 in production; tests
    /// shrink it to compress time.
    pub tick_millis: u64,
    /// Optional JSON file the question bank is seeded from at startup.
    pub seed_questions: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let question_seconds = env_u64("QUESTION_SECONDS", 60);
        let feedback_seconds = env_u64("FEEDBACK_SECONDS", 1);
        let questions_per_attempt = env_u64("QUESTIONS_PER_ATTEMPT", 10) as usize;
        let tick_millis = env_u64("TICK_MILLIS", 1000);

        let seed_questions = env::var("SEED_QUESTIONS").ok();

        Self {
            rust_log,
            question_seconds,
            feedback_seconds,
            questions_per_attempt,
            tick_millis,
            seed_questions,
        }
    }

    pub fn timer_settings(&self) -> TimerSettings {
        TimerSettings {
            question_secs: self.question_seconds,
            feedback_secs: self.feedback_seconds,
            questions_per_attempt: self.questions_per_attempt,
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
