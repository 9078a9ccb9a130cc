use super::super::super::{BoxedError, EmptyResult};
use super::TopicPattern;
use async_trait::async_trait;
use serde::Deserialize;

/// Describes a queue bound to the topic exchange
///
/// Each service role owns one queue per notification type it is interested in. The queue receives
/// a copy of every notification whose routing key matches the binding [`pattern`](QueueBinding::pattern).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueBinding {
    queue: String,
    pattern: TopicPattern,
}

impl QueueBinding {
    /// Creates a new instance from raw parts
    pub fn new(queue: impl Into<String>, pattern: TopicPattern) -> Self {
        Self {
            queue: queue.into(),
            pattern,
        }
    }

    /// Name of the queue, used for logging and bookkeeping
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Pattern with which the queue is bound to the exchange
    pub fn pattern(&self) -> &TopicPattern {
        &self.pattern
    }
}

/// Entry retrieved from a bound queue providing a raw payload
#[async_trait]
pub trait RawQueueEntry {
    /// Routing key with which the entry has been published
    fn routing_key(&self) -> &str;

    /// Payload of the item
    fn payload(&self) -> &[u8];

    /// Acknowledge the item as processed
    async fn acknowledge(&mut self) -> EmptyResult;
}

/// Useful functions for [`RawQueueEntry`] implementations with default implementations
pub trait QueueEntry: RawQueueEntry {
    /// Attempts to parse the wire-format payload into a given data structure
    fn parse_payload<'a, T>(&'a self) -> Result<T, BoxedError>
    where
        T: Deserialize<'a>;
}
