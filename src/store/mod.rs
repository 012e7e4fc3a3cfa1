// src/store/mod.rs

pub mod memory;

use std::fmt;

use async_trait::async_trait;

use crate::models::{question::Question, quiz::Quiz, submission::SubmissionRecord};

pub use memory::MemoryStore;

/// Failure surfaced by an external collaborator.
#[derive(Debug)]
pub enum StoreError {
    /// The backing store could not serve the request right now.
    Unavailable(String),
    /// The request contradicts stored state (e.g. publishing twice).
    Conflict(String),
    NotFound(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            StoreError::Conflict(msg) => write!(f, "conflict: {}", msg),
            StoreError::NotFound(msg) => write!(f, "not found: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Read side the session engine consumes: the currently published quiz and
/// the full question bank.
#[async_trait]
pub trait QuizSource: Send + Sync {
    async fn active_quiz(&self) -> Result<Option<Quiz>, StoreError>;
    async fn questions(&self) -> Result<Vec<Question>, StoreError>;
}

/// Write side: persists the single result of an attempt. The engine only
/// ever calls this once per (quiz, participant) by construction of its
/// finalize path.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, record: &SubmissionRecord) -> Result<(), StoreError>;
}
