//! Serialization and deserialization provided by [`serde_json`] using marker traits
//!
//! Implementors of the raw, byte-oriented messaging traits gain the strongly typed counterparts
//! by implementing one of the marker traits in this module. Swapping the wire format later on
//! only requires a different set of marker traits.

use super::super::super::{BoxedError, EmptyResult};
use super::super::event::{
    Notification, NotificationPublisher, QueueEntry, RawNotificationPublisher, RawQueueEntry,
};
use super::super::request::{
    OptionalRequestProcessor, RawRequestProcessor, Request, ResponderError,
};
use async_trait::async_trait;
use serde::Deserialize;

/// Marker trait providing a default [`NotificationPublisher`] implementation based on [`serde_json`]
pub trait JsonNotificationPublisher: RawNotificationPublisher + Send + Sync {}

#[async_trait]
impl<P> NotificationPublisher for P
where
    P: JsonNotificationPublisher,
{
    /// Serializes the notification using [`serde_json::to_vec`]
    async fn publish<N: Notification + Send + Sync>(&self, notification: &N) -> EmptyResult {
        let data = serde_json::to_vec(notification)?;
        self.publish_raw(&data, &notification.routing_key()).await
    }
}

/// Marker trait providing a default [`QueueEntry`] implementation based on [`serde_json`]
pub trait JsonQueueEntry: RawQueueEntry {}

impl<E> QueueEntry for E
where
    E: JsonQueueEntry,
{
    /// Parses the payload using [`serde_json::from_slice`]
    fn parse_payload<'a, T>(&'a self) -> Result<T, BoxedError>
    where
        T: Deserialize<'a>,
    {
        serde_json::from_slice(self.payload()).map_err(Into::into)
    }
}

#[async_trait]
impl<P> RawRequestProcessor for P
where
    P: OptionalRequestProcessor + Send + Sync,
    P::Request: Send + Sync,
    <P::Request as Request>::Response: Send + Sync,
{
    /// Decodes the request using [`serde_json::from_slice`] and encodes the response using [`serde_json::to_vec`]
    async fn process_raw(&self, payload: &[u8]) -> Result<Option<Vec<u8>>, ResponderError> {
        let request: P::Request = serde_json::from_slice(payload)
            .map_err(|e| ResponderError::MalformedRequest(e.into()))?;

        match self
            .maybe_process(request)
            .await
            .map_err(ResponderError::ProcessingFailed)?
        {
            Some(response) => serde_json::to_vec(&response)
                .map(Some)
                .map_err(|e| ResponderError::EncodingFailed(e.into())),
            None => Ok(None),
        }
    }
}
