//! Retry schedules for reconnecting clients.
//!
//! A [`Backoff`] yields the delay before each retry. The delay starts at the
//! configured interval and is multiplied by `factor` after every attempt,
//! capped by `max_delay`. With a `factor` of 1 the schedule is constant.
//! Once `max_attempts` delays have been handed out the schedule is exhausted
//! and yields nothing until [`Backoff::reset`] is called.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Backoff {
    interval: Duration,
    factor: u32,
    max_delay: Option<Duration>,
    max_attempts: Option<usize>,

    current: Duration,
    attempts: usize,
}

impl Backoff {
    /// Retry forever, waiting `interval` between attempts.
    pub const fn constant(interval: Duration) -> Backoff {
        Backoff::exponential(interval, 1)
    }

    /// Retry forever, starting at `base` and multiplying the delay by
    /// `factor` after each attempt.
    pub const fn exponential(base: Duration, factor: u32) -> Backoff {
        Backoff {
            interval: base,
            factor,
            max_delay: None,
            max_attempts: None,
            current: base,
            attempts: 0,
        }
    }

    /// No delay will be longer than `duration`.
    pub const fn max_delay(mut self, duration: Duration) -> Backoff {
        self.max_delay = Some(duration);
        self
    }

    /// Stop yielding delays after `attempts` retries.
    pub const fn max_attempts(mut self, attempts: usize) -> Backoff {
        self.max_attempts = Some(attempts);
        self
    }

    /// Number of delays handed out since creation or the last reset.
    #[inline]
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    #[inline]
    pub fn exhausted(&self) -> bool {
        matches!(self.max_attempts, Some(max) if self.attempts >= max)
    }

    /// The next delay to wait for, `None` once the schedule is exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.exhausted() {
            return None;
        }
        self.attempts += 1;

        let delay = match self.max_delay {
            Some(max) if self.current > max => max,
            _ => self.current,
        };

        self.current = self
            .current
            .checked_mul(self.factor)
            .unwrap_or(Duration::MAX);

        Some(delay)
    }

    pub fn reset(&mut self) {
        self.current = self.interval;
        self.attempts = 0;
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_delay()
    }
}
