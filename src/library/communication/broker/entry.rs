use super::super::super::EmptyResult;
use super::super::event::RawQueueEntry;
use super::super::implementation::json::JsonQueueEntry;
use super::Delivery;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Entry of a queue bound through a [`BrokerConnection`](super::BrokerConnection)
///
/// Acknowledgements are recorded per binding. Transports without broker-side acknowledgement
/// (like Redis PubSub) thereby still expose what has been processed.
pub struct BrokerQueueEntry {
    delivery: Delivery,
    acknowledged: Arc<AtomicUsize>,
    is_acknowledged: bool,
}

impl BrokerQueueEntry {
    pub(super) fn new(delivery: Delivery, acknowledged: Arc<AtomicUsize>) -> Self {
        Self {
            delivery,
            acknowledged,
            is_acknowledged: false,
        }
    }
}

#[async_trait]
impl RawQueueEntry for BrokerQueueEntry {
    fn routing_key(&self) -> &str {
        &self.delivery.routing_key
    }

    fn payload(&self) -> &[u8] {
        &self.delivery.payload
    }

    async fn acknowledge(&mut self) -> EmptyResult {
        if !self.is_acknowledged {
            self.is_acknowledged = true;
            self.acknowledged.fetch_add(1, Ordering::SeqCst);
        }

        Ok(())
    }
}

impl JsonQueueEntry for BrokerQueueEntry {}
