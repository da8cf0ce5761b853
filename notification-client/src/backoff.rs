//! Reconnect delays: `min(1000 * 2^attempt, 30000)` ms, five attempts.

use std::time::Duration;

pub const BASE_DELAY: Duration = Duration::from_millis(1000);
pub const MAX_DELAY: Duration = Duration::from_millis(30_000);
/// Reconnects scheduled before the controller gives up.
pub const MAX_ATTEMPTS: u32 = 5;

/// Delay before reconnect number `attempt` (zero based).
pub fn delay(attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    let millis = (BASE_DELAY.as_millis() as u64).saturating_mul(factor);
    Duration::from_millis(millis).min(MAX_DELAY)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Backoff {
    attempt: u32,
}

impl Backoff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Delay for the next reconnect, or `None` once the budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= MAX_ATTEMPTS {
            return None;
        }
        let next = delay(self.attempt);
        self.attempt += 1;
        Some(next)
    }
}
