//! Typed, synchronous request and response
//!
//! A [`Request`] names the path at which it is served and the response it expects. Callers send
//! requests through a [`Requestor`] and receive exactly one response or a [`RequestError`]. The
//! serving side implements a [`RequestProcessor`] (or [`OptionalRequestProcessor`] when some requests
//! legitimately have no answer) and mounts it into a [`RequestRouter`] which dispatches raw payloads
//! by path, regardless of whether they arrived over the network or from within the same process.

mod processor;
mod request;
mod requestor;
mod router;

pub use processor::*;
pub use request::*;
pub use requestor::*;
pub use router::*;
