//! Retry policy for engine operations.
//!
//! One generic policy keyed by error kind, applied uniformly by the use
//! case. The engines themselves never retry: they return a typed failure
//! and let the caller decide.

use deckrank_core::DeckrankError;

/// Bounded retry policy for session operations.
///
/// Only `ConcurrentModification` and `IntegrityViolation` are retryable —
/// the former by refetching current state and replaying, the latter because
/// the recovery layer may have restored a sound document in the meantime.
/// Client-out-of-sync errors (`InvalidSwipeSequence`, `StaleVote`) and
/// `EmptyDeck` are surfaced immediately.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        // one refetch-and-replay, then surface
        Self { max_attempts: 2 }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Total number of attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another attempt is worthwhile for this error.
    pub fn should_retry(&self, error: &DeckrankError) -> bool {
        error.is_concurrent_modification() || error.is_integrity_violation()
    }
}
