// src/engine/bridge.rs

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::broadcast;
use uuid::Uuid;

/// Notifications pushed to every live session.
#[derive(Debug, Clone)]
pub enum QuizEvent {
    /// A quiz transitioned Draft -> Published. Idempotent at the receiver:
    /// sessions already attempting this quiz id ignore re-delivery.
    QuizPublished { quiz_id: Uuid },
    /// Display-only; never consumed by the state machine.
    OnlineCountChanged { online: usize },
}

/// Process-wide publish/subscribe channel plus the online-participant
/// counter. Sessions subscribe at creation; dropping the receiver is the
/// unsubscribe.
pub struct EventBridge {
    tx: broadcast::Sender<QuizEvent>,
    online: AtomicUsize,
}

impl EventBridge {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(64);
        Self { tx, online: AtomicUsize::new(0) }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QuizEvent> {
        self.tx.subscribe()
    }

    pub fn online(&self) -> usize {
        self.online.load(Ordering::Relaxed)
    }

    /// Announces a freshly published quiz to all subscribed sessions.
    pub fn publish_quiz(&self, quiz_id: Uuid) {
        // No receivers (no participant online) is fine.
        let _ = self.tx.send(QuizEvent::QuizPublished { quiz_id });
    }

    pub fn participant_joined(&self) -> usize {
        let online = self.online.fetch_add(1, Ordering::Relaxed) + 1;
        let _ = self.tx.send(QuizEvent::OnlineCountChanged { online });
        online
    }

    pub fn participant_left(&self) -> usize {
        let online = self
            .online
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some(n.saturating_sub(1)))
            .map(|prev| prev.saturating_sub(1))
            .unwrap_or(0);
        let _ = self.tx.send(QuizEvent::OnlineCountChanged { online });
        online
    }
}

impl Default for EventBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_subscribers() {
        let bridge = EventBridge::new();
        let mut rx = bridge.subscribe();
        let quiz_id = Uuid::new_v4();
        bridge.publish_quiz(quiz_id);

        match rx.recv().await.unwrap() {
            QuizEvent::QuizPublished { quiz_id: got } => assert_eq!(got, quiz_id),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn online_count_tracks_joins_and_leaves() {
        let bridge = EventBridge::new();
        assert_eq!(bridge.participant_joined(), 1);
        assert_eq!(bridge.participant_joined(), 2);
        assert_eq!(bridge.participant_left(), 1);
        assert_eq!(bridge.online(), 1);
        // Never goes negative.
        bridge.participant_left();
        assert_eq!(bridge.participant_left(), 0);
    }
}
