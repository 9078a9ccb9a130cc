//! Request and response using JSON over HTTP/1.1 provided by [`hyper`]
//!
//! Every [`Request`](super::super::request::Request) is sent as a `POST` to its path with the serialized
//! request as body. The serving side answers `200` with the serialized response, `404` when the
//! processor declined to answer, `400` for undecodable requests and `500` for processing failures.

mod requestor;
mod responder;

pub use requestor::*;
pub use responder::*;
