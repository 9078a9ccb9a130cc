//! Joins synchronous calls with facts that arrive asynchronously
//!
//! A party that needs a fact which will be delivered later through the topic exchange
//! [`registers`](CorrelationRegistry::register) its interest under a subject key and receives a
//! [`PendingCorrelation`]. Whoever consumes the fact calls [`resolve`](CorrelationRegistry::resolve)
//! with the same key (compared case-insensitively). Every pending correlation completes exactly once,
//! either with the delivered value or, once its deadline passes, according to its [`TimeoutPolicy`].
//!
//! Facts may overtake the registration they belong to. Those are kept in a small, short-lived buffer
//! and handed out to the next registration of the same key.

mod pending;
mod registry;

pub use pending::*;
pub use registry::*;

use thiserror::Error;

/// What to do when no fact arrives before the deadline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeoutPolicy<V> {
    /// Complete with the given substitute value
    Fallback(V),
    /// Complete with [`CorrelationError::TimedOut`]
    Fail,
}

/// Successful completion of a [`PendingCorrelation`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<V> {
    /// A matching fact has been delivered
    Delivered(V),
    /// The deadline passed and the [`TimeoutPolicy::Fallback`] value has been substituted
    Fallback(V),
}

impl<V> Resolution<V> {
    /// Value regardless of its origin
    pub fn into_value(self) -> V {
        match self {
            Resolution::Delivered(value) | Resolution::Fallback(value) => value,
        }
    }

    /// Whether the value has actually been delivered
    pub fn is_delivered(&self) -> bool {
        matches!(self, Resolution::Delivered(_))
    }
}

/// Errors raised by the [`CorrelationRegistry`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CorrelationError {
    /// Another correlation for the same key has not completed yet
    ///
    /// Searches check for this before requesting anything from their peer. Two searches for the same
    /// subject that pass that check concurrently both trigger the fact, the later one fails on registration.
    #[error("a correlation for {key} is already pending")]
    AlreadyPending {
        /// Normalised subject key
        key: String,
    },
    /// No fact arrived before the deadline and the policy demands failure
    #[error("no fact for {key} arrived in time")]
    TimedOut {
        /// Normalised subject key
        key: String,
    },
    /// The entry vanished without a value being delivered
    #[error("correlation for {key} has been abandoned")]
    Abandoned {
        /// Normalised subject key
        key: String,
    },
}

fn normalise(key: &str) -> String {
    key.to_lowercase()
}
