use std::time::Duration;

use tokio::time::Instant;

pub const DEBOUNCE_MS: u64 = 2000;

/// Sleep used when nothing is scheduled.
const IDLE_SLEEP: Duration = Duration::from_secs(86400);

/// Pure debouncer: holds the pending flush deadline, nothing else.
/// No timers, no global state. The runner asks it when to wake up.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    /// When the next flush is due, if one is scheduled.
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Register an edit: any pending deadline is cancelled and the flush
    /// is rescheduled at `now + delay`.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Schedule at an explicit instant (retry backoff).
    ///
    /// An already-pending earlier deadline wins, so a fresh edit is not
    /// held back by a long backoff.
    pub fn schedule_at(&mut self, at: Instant) {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < at => existing,
            _ => at,
        });
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Consume the deadline if it has passed.
    pub fn take_if_due(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.deadline = None;
        true
    }

    /// Precise sleep duration until the deadline.
    pub fn sleep_duration(&self, now: Instant) -> Duration {
        let Some(deadline) = self.deadline else {
            return IDLE_SLEEP;
        };
        deadline
            .saturating_duration_since(now)
            .max(Duration::from_millis(1))
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEBOUNCE_MS))
    }
}
