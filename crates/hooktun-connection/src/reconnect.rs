//! Reconnection logic with exponential backoff

use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Reconnection policy handed to the runtime
///
/// Values are taken as configured; degenerate values are tolerated by
/// [`Backoff`] rather than rejected here.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// First delay
    pub initial_interval: Duration,
    /// Growth factor applied after each attempt
    pub multiplier: f64,
    /// Cap on a single delay
    pub max_interval: Duration,
    /// Give up once this much time has passed since start (zero = never)
    pub max_elapsed_time: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            multiplier: 1.5,
            max_interval: Duration::from_secs(60),
            max_elapsed_time: Duration::from_secs(15 * 60),
        }
    }
}

impl BackoffPolicy {
    /// Start a fresh backoff sequence
    pub fn start(&self) -> Backoff {
        Backoff {
            policy: self.clone(),
            current_backoff: self.initial_interval,
            started: Instant::now(),
            attempt: 0,
        }
    }
}

/// Reconnection errors
#[derive(Debug, Error)]
pub enum ReconnectError {
    #[error("gave up reconnecting after {attempts} attempts")]
    GaveUp { attempts: usize },
}

/// Running backoff sequence
#[derive(Debug)]
pub struct Backoff {
    policy: BackoffPolicy,
    current_backoff: Duration,
    started: Instant,
    attempt: usize,
}

impl Backoff {
    /// Next delay, or `None` once the elapsed-time budget is spent
    pub fn next_backoff(&mut self) -> Option<Duration> {
        let budget = self.policy.max_elapsed_time;
        if !budget.is_zero() && self.started.elapsed() > budget {
            return None;
        }

        let delay = self.current_backoff;
        self.attempt += 1;

        // Negative or NaN multipliers cannot produce a duration
        let next = Duration::try_from_secs_f64(delay.as_secs_f64() * self.policy.multiplier)
            .unwrap_or(self.policy.max_interval);
        self.current_backoff = next.min(self.policy.max_interval);

        Some(delay)
    }

    /// Wait before next reconnection attempt
    pub async fn wait(&mut self) -> Result<(), ReconnectError> {
        let delay = self.next_backoff().ok_or(ReconnectError::GaveUp {
            attempts: self.attempt,
        })?;

        debug!(
            "Waiting {:?} before reconnection attempt {}",
            delay, self.attempt
        );
        sleep(delay).await;
        Ok(())
    }

    /// Reset backoff (call after successful connection)
    pub fn reset(&mut self) {
        debug!("Resetting reconnection backoff");
        self.current_backoff = self.policy.initial_interval;
        self.started = Instant::now();
        self.attempt = 0;
    }

    /// Get current attempt number
    pub fn attempt(&self) -> usize {
        self.attempt
    }

    /// Get the delay the next attempt will use
    pub fn current_backoff(&self) -> Duration {
        self.current_backoff
    }
}
