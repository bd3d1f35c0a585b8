//! Debounce timer
//!
//! Delays work until a quiet period has elapsed since the last qualifying
//! event. Each poke cancels and restarts the window, so only the final
//! event within it triggers work. Built on [`tokio::time::Instant`] so
//! tests can drive it with a paused clock.

use std::time::Duration;
use tokio::time::Instant;

/// A restartable quiet-period timer.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// The configured quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a qualifying event: cancel any scheduled firing and restart
    /// the quiet window from now.
    pub fn poke(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Drop any scheduled firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether a firing is scheduled.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fire if the quiet period has elapsed, disarming so each quiet
    /// period fires at most once.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Wait until the current deadline and fire. Returns immediately when
    /// nothing is armed.
    pub async fn wait(&mut self) -> bool {
        match self.deadline {
            Some(deadline) => {
                tokio::time::sleep_until(deadline).await;
                self.deadline = None;
                true
            }
            None => false,
        }
    }
}
