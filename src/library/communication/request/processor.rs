use super::super::super::BoxedError;
use super::Request;
use async_trait::async_trait;
use thiserror::Error;

/// Error that may be thrown while responding to a request
#[derive(Error, Debug)]
pub enum ResponderError {
    /// The payload could not be decoded into the expected request
    #[error("malformed request")]
    MalformedRequest(#[source] BoxedError),
    /// The [`RequestProcessor`] threw an error
    #[error("processing request failed")]
    ProcessingFailed(#[source] BoxedError),
    /// The response could not be serialized
    #[error("unable to encode response")]
    EncodingFailed(#[source] BoxedError),
}

/// Structure which processes requests and produces responses
#[async_trait]
pub trait RequestProcessor {
    /// Type of request to process
    type Request: Request;

    /// Handler for requests, returning a response
    async fn process(
        &self,
        request: Self::Request,
    ) -> Result<<Self::Request as Request>::Response, BoxedError>;
}

/// Structure which processes requests and may either produce a response or decline to answer
///
/// Declining is reported to the caller as [`RequestError::NotFound`](super::RequestError::NotFound).
#[async_trait]
pub trait OptionalRequestProcessor {
    /// Type of request to process
    type Request: Request;

    /// Handler for requests, returning an optional response
    async fn maybe_process(
        &self,
        request: Self::Request,
    ) -> Result<Option<<Self::Request as Request>::Response>, BoxedError>;
}

#[async_trait]
impl<P> OptionalRequestProcessor for P
where
    P: RequestProcessor + Send + Sync,
    P::Request: Send + Sync,
{
    type Request = P::Request;

    async fn maybe_process(
        &self,
        request: Self::Request,
    ) -> Result<Option<<Self::Request as Request>::Response>, BoxedError> {
        Ok(Some(self.process(request).await?))
    }
}

/// Processor operating on serialized payloads
///
/// Implemented for every [`OptionalRequestProcessor`] by one of the serialization marker modules
/// (e.g. [`json`](super::super::implementation::json)).
#[async_trait]
pub trait RawRequestProcessor {
    /// Decodes the payload, processes it and encodes the response, if any
    async fn process_raw(&self, payload: &[u8]) -> Result<Option<Vec<u8>>, ResponderError>;
}
