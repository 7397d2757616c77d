/*!
 * Retry policy for field translation.
 *
 * A field job moves through `CHECK_SKIP -> {SKIPPED | ATTEMPT}`, each attempt
 * ends `ACCEPTED`, `REJECTED` or `ERRORED`, and the last two either retry
 * after a fixed backoff or end `EXHAUSTED`. `RetryBudget` holds the counters
 * for that machine; sleeping goes through `Sleeper` so tests never wait.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

use crate::errors::TranslationError;

/// Attempt budget and backoff between attempts
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Fixed wait after each failed attempt
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Result of a single attempt
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Answer passed the script check
    Accepted(String),
    /// Answer was extracted but failed the script check
    Rejected(String),
    /// Extraction or provider failure
    Errored(TranslationError),
}

/// Attempt counter for one field job
#[derive(Debug, Clone)]
pub struct RetryBudget {
    policy: RetryPolicy,
    attempt: u32,
}

impl RetryBudget {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// Index of the attempt about to run (0-based)
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Attempts left, counting the one about to run
    pub fn remaining(&self) -> u32 {
        self.policy.max_attempts.saturating_sub(self.attempt)
    }

    /// Whether another attempt may run
    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    /// Wait that follows every failed attempt, the last one included
    pub fn backoff(&self) -> Duration {
        self.policy.backoff
    }

    /// Consume the current attempt after it failed
    pub fn record_failure(&mut self) {
        self.attempt += 1;
    }
}

/// Suspends the caller for a duration
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real timer backed by tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately and remembers every requested duration
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Durations requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
    }
}
