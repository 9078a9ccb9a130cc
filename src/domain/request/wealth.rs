use crate::library::communication::request::Request;
use serde::{Deserialize, Serialize};

/// Asks for the wealth of a client
///
/// Answering it for a known client publishes a
/// [`ClientFunctionNotification`](crate::domain::event::ClientFunctionNotification).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientWealthRequest {
    /// Name of the client
    pub name: String,
}

/// Response to a [`ClientWealthRequest`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientWealthResponse {
    /// Wealth of the client
    pub avere_detinuta: String,
}

impl Request for ClientWealthRequest {
    type Response = ClientWealthResponse;

    const PATH: &'static str = "/rpc/client-wealth";
}
