use super::super::super::super::{BoxedError, EmptyResult};
use super::super::super::broker::{BrokerLink, Delivery};
use super::super::super::event::TopicPattern;
use super::CONNECT_TIMEOUT;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use log::trace;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tokio::time::timeout;

/// Live link to a redis server
///
/// Publishing goes through a shared multiplexed connection while every call to
/// [`listen`](BrokerLink::listen) opens a dedicated PubSub connection that lives as long as the returned stream.
pub struct RedisLink {
    client: Client,
    publisher: MultiplexedConnection,
}

impl RedisLink {
    pub(super) fn new(client: Client, publisher: MultiplexedConnection) -> Self {
        Self { client, publisher }
    }
}

#[async_trait]
impl BrokerLink for RedisLink {
    async fn publish(&self, routing_key: &str, payload: &[u8]) -> EmptyResult {
        let mut con = self.publisher.clone();
        let receivers: usize = con.publish(routing_key, payload).await?;
        trace!("Published {} to {} receivers", routing_key, receivers);

        Ok(())
    }

    async fn listen(
        &self,
        patterns: &[TopicPattern],
    ) -> Result<BoxStream<'static, Delivery>, BoxedError> {
        let con = timeout(CONNECT_TIMEOUT, self.client.get_async_connection()).await??;
        let mut pubsub = con.into_pubsub();

        let mut globs: Vec<String> = patterns.iter().map(TopicPattern::to_glob).collect();
        globs.sort();
        globs.dedup();

        for glob in globs.iter() {
            pubsub.psubscribe(glob.as_str()).await?;
        }

        let deliveries = pubsub
            .into_on_message()
            .map(|msg| Delivery {
                routing_key: msg.get_channel_name().to_owned(),
                payload: msg.get_payload_bytes().to_vec(),
            })
            .boxed();

        Ok(deliveries)
    }
}
