//! Broker transport using [`redis`](::redis) PubSub
//!
//! Routing keys map one-to-one onto PubSub channels. Queue bindings are translated into `PSUBSCRIBE`
//! globs which may match a superset of the topic pattern; the
//! [`BrokerConnection`](super::super::broker::BrokerConnection) re-filters every delivery with the exact
//! pattern before handing it to a queue.
//!
//! Redis PubSub neither buffers nor redelivers, so notifications published while no link is listening
//! are lost. Facts are best-effort and the correlation timeout covers this case.

mod link;
mod transport;

pub use link::*;
pub use transport::*;

use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(4);
