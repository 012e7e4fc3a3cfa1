// src/engine/runtime.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{RwLock, broadcast, mpsc, oneshot};
use tokio::time::MissedTickBehavior;

use crate::engine::bridge::{EventBridge, QuizEvent};
use crate::engine::session::{SelectOutcome, SessionMachine, SessionSnapshot, TimerSettings};
use crate::models::submission::SubmissionRecord;
use crate::store::{QuizSource, SubmissionSink};

/// How many times a failed submission write is retried before the engine
/// gives up and keeps the result local only.
const SUBMIT_ATTEMPTS: u32 = 3;

enum Command {
    Select {
        option_id: String,
        reply: oneshot::Sender<SelectOutcome>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Stop,
}

/// Cheap handle to one participant's session task.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    /// `None` means the session task is gone (left or shut down).
    pub async fn select_option(&self, option_id: &str) -> Option<SelectOutcome> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Select { option_id: option_id.to_string(), reply })
            .await
            .ok()?;
        rx.await.ok()
    }

    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::Snapshot { reply }).await.ok()?;
        rx.await.ok()
    }

    async fn stop(&self) {
        let _ = self.tx.send(Command::Stop).await;
    }
}

/// Owns every live session: one tokio task per participant, each holding
/// its state machine exclusively (the single logical thread of control per
/// session). The registry creates sessions on join and tears them down on
/// leave, releasing the bridge subscription with the task.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    bridge: Arc<EventBridge>,
    source: Arc<dyn QuizSource>,
    sink: Arc<dyn SubmissionSink>,
    settings: TimerSettings,
    tick_interval: Duration,
}

impl SessionRegistry {
    pub fn new(
        bridge: Arc<EventBridge>,
        source: Arc<dyn QuizSource>,
        sink: Arc<dyn SubmissionSink>,
        settings: TimerSettings,
        tick_interval: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            bridge,
            source,
            sink,
            settings,
            tick_interval,
        }
    }

    /// Creates (or re-fetches) the session for a participant. Returns the
    /// handle and whether a new session was created. A fresh session loads
    /// the currently active quiz right away, so participants who join after
    /// publication start against the shared deadline.
    pub async fn join(&self, participant_id: &str) -> (SessionHandle, bool) {
        let mut sessions = self.sessions.write().await;
        if let Some(handle) = sessions.get(participant_id) {
            return (handle.clone(), false);
        }

        let machine = SessionMachine::new(participant_id, self.settings);
        let events = self.bridge.subscribe();
        let (tx, rx) = mpsc::channel(16);
        let handle = SessionHandle { tx };

        tokio::spawn(run_session(
            machine,
            rx,
            events,
            Arc::clone(&self.source),
            Arc::clone(&self.sink),
            self.tick_interval,
        ));

        sessions.insert(participant_id.to_string(), handle.clone());
        drop(sessions);

        let online = self.bridge.participant_joined();
        tracing::info!("participant {} joined, {} online", participant_id, online);
        (handle, true)
    }

    pub async fn get(&self, participant_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(participant_id).cloned()
    }

    /// Tears a session down; true if one existed.
    pub async fn leave(&self, participant_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(participant_id);
        match removed {
            Some(handle) => {
                handle.stop().await;
                let online = self.bridge.participant_left();
                tracing::info!("participant {} left, {} online", participant_id, online);
                true
            }
            None => false,
        }
    }

    pub fn online(&self) -> usize {
        self.bridge.online()
    }
}

/// The session task: exclusive owner of one state machine.
///
/// Timer ticks, bridge events and user commands are serialized through one
/// select loop, which makes record/advance atomic with respect to the
/// timers. `biased` puts the tick arm first so a global expiry queued in
/// the same scheduling round beats an in-flight selection.
async fn run_session(
    mut machine: SessionMachine,
    mut commands: mpsc::Receiver<Command>,
    mut events: broadcast::Receiver<QuizEvent>,
    source: Arc<dyn QuizSource>,
    sink: Arc<dyn SubmissionSink>,
    tick_interval: Duration,
) {
    load_active_quiz(&mut machine, &source, &sink).await;

    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first interval tick completes immediately; push it out a full
    // period so second zero is not consumed at load.
    ticker.reset();

    loop {
        tokio::select! {
            biased;

            _ = ticker.tick() => {
                if let Some(record) = machine.tick() {
                    persist(&*sink, &record).await;
                }
            }

            event = events.recv() => match event {
                Ok(QuizEvent::QuizPublished { .. }) => {
                    load_active_quiz(&mut machine, &source, &sink).await;
                }
                Ok(QuizEvent::OnlineCountChanged { .. }) => {
                    // Display data only; read from the bridge when projected.
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("session {} lagged {} events", machine.participant_id(), skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },

            command = commands.recv() => match command {
                Some(Command::Select { option_id, reply }) => {
                    let _ = reply.send(machine.select_option(&option_id));
                }
                Some(Command::Snapshot { reply }) => {
                    let _ = reply.send(machine.snapshot());
                }
                Some(Command::Stop) | None => break,
            },
        }
    }
}

/// Fetches the active quiz and bank and feeds them to the machine. Source
/// failures drop the load (the session simply stays AwaitingQuiz until the
/// next notification); they are never fatal.
async fn load_active_quiz(
    machine: &mut SessionMachine,
    source: &Arc<dyn QuizSource>,
    sink: &Arc<dyn SubmissionSink>,
) {
    let quiz = match source.active_quiz().await {
        Ok(Some(quiz)) => quiz,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!("active quiz not available: {}", e);
            return;
        }
    };
    let bank = match source.questions().await {
        Ok(bank) => bank,
        Err(e) => {
            tracing::warn!("question bank not available: {}", e);
            return;
        }
    };
    if let Some(record) = machine.observe_published(quiz, bank, Utc::now()) {
        persist(&**sink, &record).await;
    }
}

/// Hands the finalized record to the store with a bounded retry. The score
/// was already computed and stays on the machine for display no matter
/// what happens here.
async fn persist(sink: &dyn SubmissionSink, record: &SubmissionRecord) {
    for attempt in 1..=SUBMIT_ATTEMPTS {
        match sink.submit(record).await {
            Ok(()) => {
                tracing::info!(
                    "submission stored for {} ({} / {})",
                    record.participant_id,
                    record.score,
                    record.total_questions
                );
                return;
            }
            Err(e) => {
                tracing::warn!(
                    "submission write failed for {} (attempt {}/{}): {}",
                    record.participant_id,
                    attempt,
                    SUBMIT_ATTEMPTS,
                    e
                );
                if attempt < SUBMIT_ATTEMPTS {
                    tokio::time::sleep(Duration::from_millis(250)).await;
                }
            }
        }
    }
    tracing::error!(
        "giving up on storing submission for {}; result stays available in the session",
        record.participant_id
    );
}
