//! Backoff decisions for a single post fetch.

use std::time::Duration;

/// Why one attempt failed, as far as retrying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connect or transfer timeout, or HTTP 408.
    Timeout,
    /// The site is rate limiting (429, 503).
    Throttled,
    /// Reset, refused, DNS failure, short read.
    Connection,
    /// Other server-side 5xx.
    Http5xx(u16),
    /// Permanent for this URL (4xx, empty page, bad URL). Never retried.
    Other,
}

impl ErrorKind {
    pub fn is_transient(self) -> bool {
        !matches!(self, ErrorKind::Other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Give up and report the error.
    Stop,
    /// Sleep, then make another attempt.
    Wait(Duration),
}

/// Capped exponential backoff over a fixed attempt budget.
///
/// Throttling responses wait twice as long as other transient failures;
/// post pages are usually rate limited per session, not per request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per fetch, the first one included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after failed attempt number `attempt` (1-based):
    /// `base_delay * 2^(attempt - 1)`, never above `max_delay`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }

    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts || !kind.is_transient() {
            return RetryDecision::Stop;
        }
        let wait = match kind {
            ErrorKind::Throttled => self.backoff(attempt + 1),
            _ => self.backoff(attempt),
        };
        RetryDecision::Wait(wait)
    }
}
