// src/engine/session.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::scoring;
use crate::engine::timer::{GlobalTimer, QuestionTimer};
use crate::models::{
    question::{PublicQuestion, Question},
    quiz::Quiz,
    submission::{AnsweredPair, SubmissionRecord},
};

/// Timer budgets and attempt sizing. Configuration, never hard-coded, so
/// tests can run with compressed time.
#[derive(Debug, Clone, Copy)]
pub struct TimerSettings {
    /// Seconds a participant may deliberate on one question.
    pub question_secs: u64,
    /// Seconds the correctness feedback stays visible before auto-advancing.
    pub feedback_secs: u64,
    /// Number of questions drawn from the bank for one attempt.
    pub questions_per_attempt: usize,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self { question_secs: 60, feedback_secs: 1, questions_per_attempt: 10 }
    }
}

/// Observable phase of one participant's attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Logged in, no published quiz observed yet.
    AwaitingQuiz,
    /// Quiz loaded, timers running, a question is on display.
    InProgress,
    /// A choice was just made; input is locked while feedback is visible.
    ShowingFeedback,
    /// Terminal: the single SubmissionRecord for this attempt exists.
    Submitted,
    /// Terminal: question data was missing or inconsistent; the attempt
    /// cannot proceed and the participant is shown an explanatory state.
    Errored,
}

/// Transient per-choice correctness indicator.
#[derive(Debug, Clone, Serialize)]
pub struct Feedback {
    pub selected_option_id: String,
    pub is_correct: bool,
}

/// Result of offering a participant's option choice to the machine.
#[derive(Debug, Clone)]
pub enum SelectOutcome {
    /// The answer was recorded and feedback is now showing.
    Recorded(Feedback),
    /// No quiz is loaded (or the attempt errored); the action was dropped.
    NotReady,
    /// The option id does not belong to the current question.
    UnknownOption,
    /// Feedback is showing or the attempt is already submitted; silent no-op.
    Ignored,
}

/// Read-only projection of the session for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub quiz_id: Option<Uuid>,
    pub quiz_title: Option<String>,
    pub question: Option<PublicQuestion>,
    pub question_index: Option<usize>,
    pub total_questions: usize,
    pub answered_count: usize,
    pub global_remaining_secs: u64,
    pub question_remaining_secs: u64,
    pub feedback: Option<Feedback>,
    pub submitted: bool,
    pub result: Option<AttemptResult>,
}

/// Final result as exposed for display, e.g. "2 / 2" at 100.0%.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptResult {
    pub score: u32,
    pub total_questions: u32,
    pub percent: f64,
    pub display: String,
}

impl AttemptResult {
    fn from_record(record: &SubmissionRecord) -> Self {
        Self {
            score: record.score,
            total_questions: record.total_questions,
            percent: record.percent(),
            display: format!("{} / {}", record.score, record.total_questions),
        }
    }
}

struct FeedbackState {
    feedback: Feedback,
    remaining_secs: u64,
}

/// Per-participant quiz session: question progression, recorded answers,
/// feedback lock, submission status.
///
/// The machine is synchronous and owns all attempt state; the owning task
/// drives it with discrete one-second `tick` calls and user choices, which
/// makes the record/advance operations atomic with respect to timer
/// callbacks. Both the question-timeout path and the global-expiry path
/// funnel into the idempotent `finalize`, so at most one SubmissionRecord
/// ever leaves a session.
pub struct SessionMachine {
    participant_id: String,
    settings: TimerSettings,
    phase: Phase,
    quiz: Option<Quiz>,
    questions: Vec<Question>,
    current_index: usize,
    answers: HashMap<Uuid, String>,
    feedback: Option<FeedbackState>,
    global: Option<GlobalTimer>,
    question_timer: QuestionTimer,
    result: Option<SubmissionRecord>,
}

impl SessionMachine {
    pub fn new(participant_id: impl Into<String>, settings: TimerSettings) -> Self {
        Self {
            participant_id: participant_id.into(),
            settings,
            phase: Phase::AwaitingQuiz,
            quiz: None,
            questions: Vec::new(),
            current_index: 0,
            answers: HashMap::new(),
            feedback: None,
            global: None,
            question_timer: QuestionTimer::new(settings.question_secs),
            result: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// Reacts to a "quiz published" notification.
    ///
    /// Idempotent per quiz id: re-delivery for the quiz already being
    /// attempted (or already submitted) never resets the attempt. A new quiz
    /// id starts a fresh attempt. The attempt's question list is the fixed
    /// deterministic prefix of the quiz's ordered question ids, resolved
    /// against the bank.
    ///
    /// Returns a SubmissionRecord only in the degenerate case where the
    /// participant joined after the shared deadline already passed, which
    /// finalizes the (empty) attempt immediately.
    pub fn observe_published(
        &mut self,
        quiz: Quiz,
        bank: Vec<Question>,
        now: DateTime<Utc>,
    ) -> Option<SubmissionRecord> {
        if let Some(current) = &self.quiz {
            if current.id == quiz.id && self.phase != Phase::AwaitingQuiz {
                return None;
            }
        }

        let Some(published_at) = quiz.published_at else {
            // A Draft quiz must never reach a session; degrade, don't panic.
            self.phase = Phase::Errored;
            return None;
        };

        let by_id: HashMap<Uuid, &Question> = bank.iter().map(|q| (q.id, q)).collect();
        let questions: Vec<Question> = quiz
            .question_ids
            .iter()
            .filter_map(|id| by_id.get(id).map(|q| (*q).clone()))
            .take(self.settings.questions_per_attempt)
            .collect();

        if questions.is_empty() {
            self.phase = Phase::Errored;
            self.quiz = Some(quiz);
            return None;
        }

        let global = GlobalTimer::start(quiz.duration_secs(), published_at, now);

        self.quiz = Some(quiz);
        self.questions = questions;
        self.current_index = 0;
        self.answers.clear();
        self.feedback = None;
        self.question_timer = QuestionTimer::new(self.settings.question_secs);
        self.result = None;
        self.phase = Phase::InProgress;

        if global.remaining_secs() == 0 {
            // Joined after the shared deadline: nothing left to answer.
            self.global = Some(global);
            return self.finalize();
        }
        self.global = Some(global);
        None
    }

    /// Records the participant's choice for the current question.
    ///
    /// Dropped while feedback is visible (input lock) and after submission;
    /// re-answering the same question id would overwrite, but the lock makes
    /// that unreachable through this path.
    pub fn select_option(&mut self, option_id: &str) -> SelectOutcome {
        match self.phase {
            Phase::AwaitingQuiz | Phase::Errored => return SelectOutcome::NotReady,
            Phase::ShowingFeedback | Phase::Submitted => return SelectOutcome::Ignored,
            Phase::InProgress => {}
        }

        let Some(question) = self.questions.get(self.current_index) else {
            self.phase = Phase::Errored;
            return SelectOutcome::NotReady;
        };

        if !question.options.iter().any(|o| o.id == option_id) {
            return SelectOutcome::UnknownOption;
        }

        let is_correct = question.correct_option_id == option_id;
        self.answers.insert(question.id, option_id.to_string());

        let feedback = Feedback {
            selected_option_id: option_id.to_string(),
            is_correct,
        };
        self.feedback = Some(FeedbackState {
            feedback: feedback.clone(),
            remaining_secs: self.settings.feedback_secs,
        });
        self.phase = Phase::ShowingFeedback;
        SelectOutcome::Recorded(feedback)
    }

    /// Advances all countdowns by one wall-clock second.
    ///
    /// Global expiry is evaluated first so it wins a tie against anything
    /// else scheduled in the same tick. While feedback is visible only the
    /// feedback delay counts down; the question budget is suspended.
    pub fn tick(&mut self) -> Option<SubmissionRecord> {
        match self.phase {
            Phase::InProgress | Phase::ShowingFeedback => {}
            _ => return None,
        }

        if let Some(global) = &mut self.global {
            if global.tick() {
                return self.finalize();
            }
        }

        if self.phase == Phase::ShowingFeedback {
            let cleared = match &mut self.feedback {
                Some(state) => {
                    state.remaining_secs = state.remaining_secs.saturating_sub(1);
                    state.remaining_secs == 0
                }
                // Feedback phase without feedback state is unreachable;
                // recover by clearing.
                None => true,
            };
            if cleared {
                self.feedback = None;
                self.phase = Phase::InProgress;
                return self.advance();
            }
            return None;
        }

        if self.question_timer.tick() {
            // Timed out: no answer recorded, no feedback shown.
            return self.advance();
        }
        None
    }

    /// Advance rule: next question with a fresh budget, or finalize after
    /// the last one.
    fn advance(&mut self) -> Option<SubmissionRecord> {
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.question_timer.reset();
            None
        } else {
            self.finalize()
        }
    }

    /// Idempotent finalize: computes the score and emits the attempt's
    /// single SubmissionRecord. Every later call, tick, or selection is a
    /// no-op.
    pub fn finalize(&mut self) -> Option<SubmissionRecord> {
        if self.phase == Phase::Submitted || self.result.is_some() {
            return None;
        }
        let quiz = self.quiz.as_ref()?;

        let answers: Vec<AnsweredPair> = self
            .questions
            .iter()
            .filter_map(|q| {
                self.answers.get(&q.id).map(|option_id| AnsweredPair {
                    question_id: q.id,
                    option_id: option_id.clone(),
                })
            })
            .collect();

        let record = SubmissionRecord {
            id: Uuid::new_v4(),
            quiz_id: quiz.id,
            participant_id: self.participant_id.clone(),
            score: scoring::score(&self.questions, &answers),
            total_questions: self.questions.len() as u32,
            answers,
            submitted_at: Utc::now(),
        };

        self.feedback = None;
        self.phase = Phase::Submitted;
        self.result = Some(record.clone());
        Some(record)
    }

    /// The final record, kept locally even if the store write failed.
    pub fn result(&self) -> Option<&SubmissionRecord> {
        self.result.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let question = match self.phase {
            Phase::InProgress | Phase::ShowingFeedback => {
                self.questions.get(self.current_index).map(Question::public)
            }
            _ => None,
        };
        SessionSnapshot {
            phase: self.phase,
            quiz_id: self.quiz.as_ref().map(|q| q.id),
            quiz_title: self.quiz.as_ref().map(|q| q.title.clone()),
            question_index: question.as_ref().map(|_| self.current_index),
            question,
            total_questions: self.questions.len(),
            answered_count: self.answers.len(),
            global_remaining_secs: self
                .global
                .as_ref()
                .map(GlobalTimer::remaining_secs)
                .unwrap_or(0),
            question_remaining_secs: self.question_timer.remaining_secs(),
            feedback: self.feedback.as_ref().map(|f| f.feedback.clone()),
            submitted: self.phase == Phase::Submitted,
            result: self.result.as_ref().map(AttemptResult::from_record),
        }
    }
}
