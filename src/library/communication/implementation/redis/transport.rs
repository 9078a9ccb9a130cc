use super::super::super::super::BoxedError;
use super::super::super::broker::BrokerTransport;
use super::{RedisLink, CONNECT_TIMEOUT};
use async_trait::async_trait;
use redis::{Client, RedisResult};
use tokio::time::timeout;

/// [`BrokerTransport`] connecting to a redis server
pub struct RedisTransport {
    client: Client,
}

impl RedisTransport {
    /// Creates a new transport for the given url (e.g. `redis://localhost:6379/`).
    ///
    /// No connection is made until the first call to [`connect`](BrokerTransport::connect).
    pub fn new(url: &str) -> RedisResult<Self> {
        Ok(Self {
            client: Client::open(url)?,
        })
    }
}

#[async_trait]
impl BrokerTransport for RedisTransport {
    type Link = RedisLink;

    async fn connect(&self) -> Result<Self::Link, BoxedError> {
        let publisher = timeout(
            CONNECT_TIMEOUT,
            self.client.get_multiplexed_tokio_connection(),
        )
        .await??;

        Ok(RedisLink::new(self.client.clone(), publisher))
    }
}
