//! Idle backoff between polls of an empty queue.

use std::time::Duration;

/// Default pause after an empty poll.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long the consumer waits after finding the queue empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same pause after every empty poll.
    Fixed(Duration),
    /// Doubles with each consecutive empty poll, starting at `initial` and
    /// capped at `max`. Resets once a request arrives.
    Exponential { initial: Duration, max: Duration },
    /// No pause at all. Intended for tests.
    Immediate,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Fixed(DEFAULT_POLL_INTERVAL)
    }
}

impl Backoff {
    /// Delay after `idle_streak` consecutive empty polls (0 for the first).
    pub fn delay(&self, idle_streak: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { initial, max } => {
                let factor = 1u32.checked_shl(idle_streak).unwrap_or(u32::MAX);
                initial.saturating_mul(factor).min(max)
            }
            Self::Immediate => Duration::ZERO,
        }
    }
}
