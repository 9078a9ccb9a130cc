//! Structures for handling and sending HTTP requests

mod forward;
mod health;
mod json;
mod responder;

pub use forward::{forward_request, uri_with_path, ForwardError};
pub use health::HealthResponder;
pub use json::{bearer_token, json_response, message_response, read_json_body, BodyError};
pub use responder::{
    dispatch, make_responder_chain_service_fn, responder_chain, unhandled, Responder,
    REQUEST_ID_HEADER,
};
