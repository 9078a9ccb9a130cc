use super::super::super::EmptyResult;
use super::Notification;
use super::{QueueBinding, QueueEntry, QueueProvider, RawQueueEntry};
use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::any::type_name;

/// Entity which may consume and process [`Notifications`](Notification)
#[async_trait]
pub trait Consumer {
    /// Notification to consume
    type Notification: Notification;

    /// Processes an event notification and returns whether it succeeded or failed
    async fn consume(&self, notification: Self::Notification) -> EmptyResult;
}

/// Helper functions to aid the consumption of messages
#[async_trait]
pub trait ConsumerExt {
    /// Consumes notifications from a bound queue using the given provider.
    ///
    /// Entries are processed one at a time in delivery order. Every entry is acknowledged, regardless
    /// of whether it could be decoded or processed: failures are logged and the entry is dropped so
    /// that a single malformed payload never stalls or terminates the loop.
    async fn consume_queue<Q>(&self, provider: &Q, binding: QueueBinding) -> EmptyResult
    where
        Q: QueueProvider + Send + Sync;
}

#[async_trait]
impl<C> ConsumerExt for C
where
    C: Consumer + Send + Sync,
    C::Notification: DeserializeOwned + Send + Sync,
{
    async fn consume_queue<Q>(&self, provider: &Q, binding: QueueBinding) -> EmptyResult
    where
        Q: QueueProvider + Send + Sync,
    {
        let queue = binding.queue().to_owned();
        let mut stream = provider.consume(binding).await?;

        while let Some(mut entry) = stream.next().await {
            match entry.parse_payload::<C::Notification>() {
                Ok(notification) => {
                    if let Err(e) = self.consume(notification).await {
                        warn!(
                            "Failed to consume {} from {}: {}",
                            type_name::<C::Notification>(),
                            entry.routing_key(),
                            e
                        );
                    }
                }
                Err(e) => warn!(
                    "Dropping malformed {} from {}: {}",
                    type_name::<C::Notification>(),
                    entry.routing_key(),
                    e
                ),
            }

            if let Err(e) = entry.acknowledge().await {
                warn!(
                    "Failed to acknowledge {}: {}",
                    type_name::<C::Notification>(),
                    e
                )
            }
        }

        debug!("Queue {} has been closed", queue);

        Ok(())
    }
}
