//! Process-wide connection to the topic exchange
//!
//! A [`BrokerConnection`] owns exactly one live link to the broker at a time and shares it between
//! every publish call and every bound queue. The link itself is provided by a [`BrokerTransport`]
//! implementation (e.g. [Redis](super::implementation::redis) or the in-process
//! [memory exchange](super::implementation::memory)).
//!
//! Establishing and re-establishing the link is the responsibility of
//! [`supervise`](BrokerConnection::supervise), a never-ending loop meant to run as a background job.
//! Whenever the link dies, publishing fails fast with [`BrokerError::Unavailable`] until the supervisor
//! has reconnected and re-asserted all queue bindings. Queue streams handed out by
//! [`bind`](BrokerConnection::bind) survive reconnects transparently.

mod connection;
mod entry;

pub use connection::*;
pub use entry::*;

use super::super::{BoxedError, EmptyResult};
use super::event::TopicPattern;
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

/// Raw message as received from the exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Routing key with which the message has been published
    pub routing_key: String,
    /// Opaque payload
    pub payload: Vec<u8>,
}

/// Errors surfaced by the [`BrokerConnection`]
#[derive(Debug, Error)]
pub enum BrokerError {
    /// There is currently no live link to the broker
    #[error("broker unavailable")]
    Unavailable,
    /// The link failed while publishing
    #[error("publishing to the broker failed")]
    PublishFailed(#[source] BoxedError),
}

/// Factory for links to a broker
#[async_trait]
pub trait BrokerTransport: Send + Sync + 'static {
    /// Link type produced by this transport
    type Link: BrokerLink + Send + Sync + 'static;

    /// Establishes a new link and asserts the shared exchange
    async fn connect(&self) -> Result<Self::Link, BoxedError>;
}

/// Single established connection to a broker
#[async_trait]
pub trait BrokerLink {
    /// Publishes an opaque payload onto the exchange
    async fn publish(&self, routing_key: &str, payload: &[u8]) -> EmptyResult;

    /// Subscribes to all given patterns and streams matching deliveries.
    ///
    /// The stream ends when the link dies. Deliveries may be a superset of what the patterns match.
    async fn listen(
        &self,
        patterns: &[TopicPattern],
    ) -> Result<BoxStream<'static, Delivery>, BoxedError>;
}
