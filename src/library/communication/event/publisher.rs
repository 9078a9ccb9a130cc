use super::super::super::EmptyResult;
use super::Notification;
use async_trait::async_trait;

/// Structure which allows publishing of serialized data onto the topic exchange
#[async_trait]
pub trait RawNotificationPublisher {
    /// Sends an opaque payload with the given routing key
    async fn publish_raw(&self, data: &[u8], routing_key: &str) -> EmptyResult;
}

/// Publisher for [`Notifications`](Notification)
#[async_trait]
pub trait NotificationPublisher {
    /// Publishes a [`Notification`] using its own routing key
    async fn publish<N: Notification + Send + Sync>(&self, notification: &N) -> EmptyResult;
}
