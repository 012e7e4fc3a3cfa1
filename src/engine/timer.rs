// src/engine/timer.rs

use chrono::{DateTime, Utc};

/// Whole-quiz countdown anchored to the publish timestamp.
///
/// Every participant derives the same absolute deadline from
/// `published_at + duration`, no matter when they loaded the quiz. The
/// countdown is driven by discrete one-second ticks from the owning
/// session task; once it reaches zero it reports expiry exactly once and
/// every later tick is a no-op.
#[derive(Debug, Clone)]
pub struct GlobalTimer {
    remaining_secs: u64,
    fired: bool,
}

impl GlobalTimer {
    /// Derives the remaining time from the publish anchor.
    ///
    /// `remaining = duration - floor(now - published_at)`, clamped at 0.
    /// Must be called afresh every time the active quiz is (re)loaded, so a
    /// late joiner does not get the full duration back.
    pub fn start(duration_secs: u64, published_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let elapsed = (now - published_at).num_seconds().max(0) as u64;
        Self {
            remaining_secs: duration_secs.saturating_sub(elapsed),
            fired: false,
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// Advances the countdown by one second.
    ///
    /// Returns `true` exactly once, on the tick that reaches zero. The
    /// caller is expected to stop ticking an expired timer, but extra ticks
    /// are harmless.
    pub fn tick(&mut self) -> bool {
        if self.fired {
            return false;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.fired = true;
            return true;
        }
        false
    }
}

/// Per-question countdown bounding how long a participant may deliberate.
///
/// Reset to the full budget whenever the question index changes. Not
/// ticked while feedback is displayed, so the feedback delay never
/// consumes question time.
#[derive(Debug, Clone)]
pub struct QuestionTimer {
    budget_secs: u64,
    remaining_secs: u64,
}

impl QuestionTimer {
    pub fn new(budget_secs: u64) -> Self {
        Self { budget_secs, remaining_secs: budget_secs }
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// Restores the full budget for the next question.
    pub fn reset(&mut self) {
        self.remaining_secs = self.budget_secs;
    }

    /// Advances the countdown by one second; returns `true` on expiry.
    pub fn tick(&mut self) -> bool {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.remaining_secs == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn global_timer_derives_remaining_from_publish_anchor() {
        let published_at = Utc::now();
        let now = published_at + Duration::milliseconds(125_000);
        let timer = GlobalTimer::start(600, published_at, now);
        assert_eq!(timer.remaining_secs(), 475);
    }

    #[test]
    fn global_timer_clamps_to_zero_after_deadline() {
        let published_at = Utc::now();
        let now = published_at + Duration::seconds(700);
        let timer = GlobalTimer::start(600, published_at, now);
        assert_eq!(timer.remaining_secs(), 0);
    }

    #[test]
    fn global_timer_fires_exactly_once() {
        let now = Utc::now();
        let mut timer = GlobalTimer::start(2, now, now);
        assert!(!timer.tick());
        assert!(timer.tick());
        assert!(!timer.tick());
        assert_eq!(timer.remaining_secs(), 0);
    }

    #[test]
    fn question_timer_reset_restores_full_budget() {
        let mut timer = QuestionTimer::new(60);
        for _ in 0..45 {
            timer.tick();
        }
        assert_eq!(timer.remaining_secs(), 15);
        timer.reset();
        assert_eq!(timer.remaining_secs(), 60);
    }

    #[test]
    fn question_timer_expires_after_budget_ticks() {
        let mut timer = QuestionTimer::new(3);
        assert!(!timer.tick());
        assert!(!timer.tick());
        assert!(timer.tick());
    }
}
