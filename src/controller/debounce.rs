//! Trailing-edge debounce timer.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Collapses bursts of triggers into one firing after a quiet period.
///
/// Every [`trigger`](Self::trigger) pushes the deadline back by the full
/// delay. The owner polls [`fired`](Self::fired) in its event loop and
/// calls [`cancel`](Self::cancel) once it has acted on a firing.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    /// Creates an idle debouncer.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    /// (Re)arms the timer.
    pub fn trigger(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Disarms the timer.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns `true` while a firing is pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Changes the delay used by later triggers.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Completes when the deadline passes; never completes while idle.
    pub async fn fired(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}
