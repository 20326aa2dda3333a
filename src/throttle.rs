//! Fixed-interval pacing for calls to rate-limited providers.
//!
//! The summarizer calls [`Throttle::ready`] before each unit of external work
//! and [`Throttle::complete`] after it. `ready` waits until at least
//! `interval` has passed since the last completion, so the first unit runs
//! immediately and no pause follows the last one.

use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_completed: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_completed: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next unit of work may start.
    pub async fn ready(&mut self) {
        let Some(last) = self.last_completed else {
            return;
        };
        let elapsed = last.elapsed();
        if elapsed < self.interval {
            let wait = self.interval - elapsed;
            debug!(?wait, "Throttling before next request");
            sleep(wait).await;
        }
    }

    /// Record that a unit of work just finished.
    pub fn complete(&mut self) {
        self.last_completed = Some(Instant::now());
    }
}
