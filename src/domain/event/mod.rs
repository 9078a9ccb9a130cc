//! Facts published onto the topic exchange
//!
//! Whenever a service answers a request about a subject it knows, it publishes a detail fact about
//! the same subject for the peer service which will be waiting for it.

mod client;
mod company;

pub use client::ClientFunctionNotification;
pub use company::CompanyHeadcountNotification;

use crate::library::communication::event::Notification;

/// [`Notification`] carrying one piece of information about a named subject
pub trait DetailFact: Notification {
    /// Name of the subject the fact is about
    fn subject(&self) -> &str;

    /// Consumes the fact and returns the information it carries
    fn into_value(self) -> String;
}
