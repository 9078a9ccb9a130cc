//! Structures to realise topic based publish and subscribe
//!
//! Services have no direct knowledge of each other on this path. Whenever something that is of
//! interest to other services happens, a [`Notification`] is published onto a shared topic exchange
//! using a routing key derived from its [`TopicDescriptor`]. Every interested party binds a queue
//! to the exchange with a [`TopicPattern`] and receives a copy of each matching notification.
//!
//! Delivery is at-least-once and broadcast-style: every binding whose pattern matches receives the
//! notification, consumers acknowledge what they received and unprocessable entries are dropped
//! instead of being redelivered. Consumption must therefore be idempotent and order independent.

mod consumer;
mod notification;
mod publisher;
mod queue;
mod queue_provider;
mod topic;

pub use consumer::*;
pub use notification::*;
pub use publisher::*;
pub use queue::*;
pub use queue_provider::*;
pub use topic::*;
