//! Retry bound and backoff for a generation sequence.

use std::time::Duration;

use super::client::CallError;

/// Why a retry was scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryCause {
    /// Relay answered 429
    RateLimited,
    /// The relay call failed below HTTP
    Network,
}

impl RetryCause {
    /// Classify a failed call. `None` means the failure is terminal.
    pub fn of(err: &CallError) -> Option<Self> {
        match err {
            CallError::Http { status: 429, .. } => Some(Self::RateLimited),
            CallError::Network(_) => Some(Self::Network),
            _ => None,
        }
    }
}

/// Fixed retry limits: 3 calls in total, 2s after a rate limit, 1s after a
/// network failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls per sequence, initial call included
    pub max_attempts: u32,
    pub rate_limit_backoff: Duration,
    pub network_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_backoff: Duration::from_secs(2),
            network_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, cause: RetryCause) -> Duration {
        match cause {
            RetryCause::RateLimited => self.rate_limit_backoff,
            RetryCause::Network => self.network_backoff,
        }
    }
}

/// Per-sequence retry bookkeeping, discarded when the sequence ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryState {
    /// Calls issued so far
    pub calls: u32,
    /// Retries scheduled so far
    pub attempt_count: u32,
    pub last_cause: Option<RetryCause>,
}

impl RetryState {
    pub fn record_call(&mut self) {
        self.calls += 1;
    }

    /// Decide whether a failed call gets another attempt.
    ///
    /// Returns the wait before the next call, or `None` when the failure is
    /// terminal or the bound is reached.
    pub fn schedule_retry(&mut self, policy: &RetryPolicy, err: &CallError) -> Option<Duration> {
        let cause = RetryCause::of(err)?;
        if self.calls >= policy.max_attempts {
            return None;
        }
        self.attempt_count += 1;
        self.last_cause = Some(cause);
        Some(policy.backoff(cause))
    }
}
