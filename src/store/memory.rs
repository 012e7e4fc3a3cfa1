// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    question::{CreateQuestionRequest, Question},
    quiz::{Quiz, QuizStatus},
    submission::{LeaderboardEntry, SubmissionRecord},
};
use crate::store::{QuizSource, StoreError, SubmissionSink};

/// In-memory backing store for the question bank, the daily quizzes and the
/// submission log. Stands in for the external persistence collaborators.
#[derive(Default)]
pub struct MemoryStore {
    questions: RwLock<Vec<Question>>,
    quizzes: RwLock<HashMap<Uuid, Quiz>>,
    active_quiz: RwLock<Option<Uuid>>,
    submissions: RwLock<Vec<SubmissionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_question(&self, req: CreateQuestionRequest) -> Result<Question, StoreError> {
        if !req.options.iter().any(|o| o.id == req.correct_option_id) {
            return Err(StoreError::Conflict(
                "correct_option_id does not match any option".to_string(),
            ));
        }
        let question = Question {
            id: Uuid::new_v4(),
            prompt: req.prompt,
            options: req.options,
            correct_option_id: req.correct_option_id,
            created_at: Utc::now(),
        };
        self.questions.write().await.push(question.clone());
        Ok(question)
    }

    pub async fn list_questions(&self) -> Vec<Question> {
        self.questions.read().await.clone()
    }

    pub async fn create_quiz(
        &self,
        title: String,
        duration_minutes: u32,
        question_ids: Vec<Uuid>,
    ) -> Result<Quiz, StoreError> {
        let bank = self.questions.read().await;
        for id in &question_ids {
            if !bank.iter().any(|q| q.id == *id) {
                return Err(StoreError::NotFound(format!("question {} does not exist", id)));
            }
        }
        drop(bank);

        let quiz = Quiz {
            id: Uuid::new_v4(),
            title,
            duration_minutes,
            question_ids,
            status: QuizStatus::Draft,
            published_at: None,
        };
        self.quizzes.write().await.insert(quiz.id, quiz.clone());
        Ok(quiz)
    }

    /// Draft -> Published transition. Stamps `published_at` exactly once and
    /// makes the quiz the active one.
    pub async fn publish_quiz(&self, quiz_id: Uuid) -> Result<Quiz, StoreError> {
        let mut quizzes = self.quizzes.write().await;
        let quiz = quizzes
            .get_mut(&quiz_id)
            .ok_or_else(|| StoreError::NotFound(format!("quiz {} does not exist", quiz_id)))?;

        if quiz.status == QuizStatus::Published {
            return Err(StoreError::Conflict("quiz is already published".to_string()));
        }

        quiz.status = QuizStatus::Published;
        quiz.published_at = Some(Utc::now());
        let quiz = quiz.clone();
        drop(quizzes);

        *self.active_quiz.write().await = Some(quiz.id);
        Ok(quiz)
    }

    pub async fn get_quiz(&self, quiz_id: Uuid) -> Option<Quiz> {
        self.quizzes.read().await.get(&quiz_id).cloned()
    }

    pub async fn submissions_for(&self, quiz_id: Uuid) -> Vec<SubmissionRecord> {
        self.submissions
            .read()
            .await
            .iter()
            .filter(|r| r.quiz_id == quiz_id)
            .cloned()
            .collect()
    }

    /// Top results for a quiz: best score first, earlier submission breaking
    /// ties.
    pub async fn leaderboard(&self, quiz_id: Uuid, limit: usize) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .submissions
            .read()
            .await
            .iter()
            .filter(|r| r.quiz_id == quiz_id)
            .map(|r| LeaderboardEntry {
                participant_id: r.participant_id.clone(),
                score: r.score,
                total_questions: r.total_questions,
                submitted_at: r.submitted_at,
            })
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.submitted_at.cmp(&b.submitted_at)));
        entries.truncate(limit);
        entries
    }
}

#[async_trait]
impl QuizSource for MemoryStore {
    async fn active_quiz(&self) -> Result<Option<Quiz>, StoreError> {
        let active = *self.active_quiz.read().await;
        match active {
            Some(id) => Ok(self.quizzes.read().await.get(&id).cloned()),
            None => Ok(None),
        }
    }

    async fn questions(&self) -> Result<Vec<Question>, StoreError> {
        Ok(self.questions.read().await.clone())
    }
}

#[async_trait]
impl SubmissionSink for MemoryStore {
    /// Write-once per (quiz, participant): a duplicate is acknowledged
    /// without touching the stored record.
    async fn submit(&self, record: &SubmissionRecord) -> Result<(), StoreError> {
        let mut submissions = self.submissions.write().await;
        let exists = submissions
            .iter()
            .any(|r| r.quiz_id == record.quiz_id && r.participant_id == record.participant_id);
        if !exists {
            submissions.push(record.clone());
        }
        Ok(())
    }
}
