use super::super::super::BoxedError;
use super::Request;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Error type for sending requests
#[derive(Error, Debug)]
pub enum RequestError {
    /// The peer does not know the subject of the request
    #[error("requested subject not found")]
    NotFound,
    /// The peer could not be reached
    #[error("peer unreachable")]
    Unreachable(#[source] BoxedError),
    /// The peer answered with a status that has no meaning for this request
    #[error("peer responded with unexpected status {0}")]
    UnexpectedStatus(u16),
    /// The peer did not answer within the given time
    #[error("peer did not answer within {0:?}")]
    TimedOut(Duration),
    /// The request could not be serialized
    #[error("unable to encode request")]
    EncodingFailed(#[source] BoxedError),
    /// The response could not be received or parsed
    #[error("response not receivable")]
    ReceptionFailed(#[source] BoxedError),
}

/// Handler for sending requests and receiving their response
#[async_trait]
pub trait Requestor {
    /// Sends out a request and awaits its response
    async fn request<R>(&self, request: &R) -> Result<R::Response, RequestError>
    where
        R: Request + Send + Sync,
        R::Response: Send + Sync;
}
