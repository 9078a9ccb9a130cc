use super::super::super::BoxedError;
use super::{QueueBinding, QueueEntry};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Allows consumption of bound queues
#[async_trait]
pub trait QueueProvider {
    /// Type of [`QueueEntry`] returned by the provider
    type Entry: QueueEntry + Send + Sync;

    /// Binds the queue to the exchange (or re-uses an existing binding) and streams its entries.
    ///
    /// The stream stays alive across transport reconnects; it only ends when the provider is shut down.
    async fn consume(
        &self,
        binding: QueueBinding,
    ) -> Result<BoxStream<'static, Self::Entry>, BoxedError>;
}
