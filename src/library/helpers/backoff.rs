//! Exponential backoff implementations

use rand::Rng;
use std::{iter::Iterator, time::Duration};

/// Exponential backoff iterator
///
/// Each element is the previous delay multiplied by the `multiplier` property, capped at `max`.
/// When a `limit` is set the iterator ends after that many elements, otherwise it keeps yielding the
/// capped delay forever. Every yielded value is spread by up to `jitter` (a fraction of the delay)
/// so that multiple instances reconnecting at once do not stampede the remote.
#[derive(Debug, Clone)]
pub struct Backoff {
    retries: u32,
    limit: Option<u32>,
    multiplier: u32,
    initial: Duration,
    current: Duration,
    max: Duration,
    jitter: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::unbounded(Duration::from_millis(500), Duration::from_secs(30))
    }
}

impl Backoff {
    /// Creates a backoff that starts at `initial`, doubles each step, never exceeds `max` and never ends
    pub fn unbounded(initial: Duration, max: Duration) -> Self {
        Self {
            retries: 0,
            limit: None,
            multiplier: 2,
            initial,
            current: initial,
            max,
            jitter: 0.2,
        }
    }

    /// Ends the iterator after `limit` elements
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Replaces the jitter fraction, clamped to `0.0..=1.0`
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.max(0.0).min(1.0);
        self
    }

    /// Number of delays handed out since the last reset
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Starts over from the initial delay, e.g. after a connection has been established successfully
    pub fn reset(&mut self) {
        self.retries = 0;
        self.current = self.initial;
    }

    fn spread(&self, delay: Duration) -> Duration {
        if self.jitter <= f64::EPSILON {
            return delay;
        }

        let factor = rand::thread_rng().gen_range(1.0 - self.jitter..=1.0);
        delay.mul_f64(factor)
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(limit) = self.limit {
            if self.retries >= limit {
                return None;
            }
        }

        let delay = self.current;
        self.retries += 1;
        self.current = (self.current * self.multiplier).min(self.max);

        Some(self.spread(delay))
    }
}
