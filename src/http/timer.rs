use std::time::Duration;
use tokio::time::Instant;

/// Tracks the last activity on a connection and derives its idle deadline.
#[derive(Debug, Clone, Copy)]
pub struct IdleTimer {
    timeout: Duration,
    last_activity: Instant,
}

impl IdleTimer {
    pub fn new(timeout: Duration, now: Instant) -> Self {
        Self {
            timeout,
            last_activity: now,
        }
    }

    /// Records activity at `now`, pushing the deadline forward.
    ///
    /// Time never moves backwards here: an older `now` is ignored.
    pub fn touch(&mut self, now: Instant) {
        if now > self.last_activity {
            self.last_activity = now;
        }
    }

    pub fn deadline(&self) -> Instant {
        self.last_activity + self.timeout
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline()
    }
}
