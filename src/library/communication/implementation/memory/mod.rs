//! In-process implementations
//!
//! The [`MemoryExchange`] behaves like a topic exchange living inside the current process and the
//! [`LocalRequestor`] hands requests directly to a [`RequestRouter`](super::super::request::RequestRouter).
//! Together they allow running multiple service roles against each other without external
//! infrastructure. Both can simulate outages and count what passed through them.

mod exchange;
mod requestor;

pub use exchange::*;
pub use requestor::*;
