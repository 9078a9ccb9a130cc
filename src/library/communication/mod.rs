//! Structures for communication between services in a distributed system
//!
//! In general, there are two modes of operation:
//!
//! 1. Publish and subscribe
//! 2. Request and response
//!
//! The first is used for facts that become known as a side effect of some operation. They are
//! published as [`Notifications`](event::Notification) onto a shared topic exchange through the
//! [`broker`] connection and everybody interested can bind a queue and consume them. For more details
//! consult the [`event`] module.
//!
//! The second mode is a plain synchronous call where one service asks another one for a piece of
//! information and waits for exactly one answer. This is implemented using the
//! [`Request`](request::Request) trait.
//!
//! Joining both modes, i.e. waiting for a fact that will be published as a consequence of a request,
//! is what the [`correlation`] module is for.

pub mod broker;
pub mod correlation;
pub mod event;
pub mod implementation;
pub mod request;
