//! Retry policy for network fetches.

use std::time::Duration;

/// Delay applied after a failed attempt, before the next one.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// Retry immediately
    None,
    /// Same delay after every failure
    Fixed(Duration),
    /// `base * 2^(n-1)` after the n-th failure, capped at `max`
    Exponential {
        base: Duration,
        max: Duration,
        jitter: bool,
    },
}

/// Attempt budget plus delay function.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Retry up to `max_attempts` times with no delay.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::None,
        }
    }

    /// Total attempts to make; never less than one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match &self.backoff {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential { base, max, jitter } => {
                let shift = attempt.saturating_sub(1).min(16);
                let delay = base.saturating_mul(1u32 << shift).min(*max);
                if *jitter && !delay.is_zero() {
                    // up to +50%, still capped
                    let extra = fastrand::u64(0..=delay.as_millis() as u64 / 2);
                    (delay + Duration::from_millis(extra)).min(*max)
                } else {
                    delay
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::immediate(3)
    }
}
