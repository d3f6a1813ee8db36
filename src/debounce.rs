//! Quiet-period debouncer for text input

use std::time::{Duration, Instant};

/// Holds the latest pushed value until no new value has arrived for the
/// whole quiet period. Each push restarts the timer.
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet_period: Duration,
    pending: Option<T>,
    last_push: Option<Instant>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
            last_push: None,
        }
    }

    /// Applies to the value already pending as well.
    pub fn set_quiet_period(&mut self, quiet_period: Duration) {
        self.quiet_period = quiet_period;
    }

    pub fn push_at(&mut self, value: T, now: Instant) {
        self.pending = Some(value);
        self.last_push = Some(now);
    }

    /// Release the pending value once the input has been quiet long enough.
    pub fn tick_at(&mut self, now: Instant) -> Option<T> {
        let last = self.last_push?;
        if now.saturating_duration_since(last) < self.quiet_period {
            return None;
        }
        self.last_push = None;
        self.pending.take()
    }

    /// Time left before `tick_at` would release, for scheduling a wake-up
    pub fn time_until_fire(&self, now: Instant) -> Option<Duration> {
        self.pending.as_ref()?;
        let last = self.last_push?;
        let elapsed = now.saturating_duration_since(last);
        Some(self.quiet_period.saturating_sub(elapsed))
    }
}
