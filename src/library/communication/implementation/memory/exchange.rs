use super::super::super::super::{BoxedError, EmptyResult};
use super::super::super::broker::{BrokerLink, BrokerTransport, Delivery};
use super::super::super::event::TopicPattern;
use async_trait::async_trait;
use futures::channel::mpsc;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors raised by the [`MemoryExchange`]
#[derive(Debug, Error)]
pub enum MemoryExchangeError {
    /// Exchange is refusing new links
    #[error("exchange is unavailable")]
    Unavailable,
    /// Link has been severed by a call to [`MemoryExchange::disconnect`]
    #[error("link has been disconnected")]
    Disconnected,
}

struct Listener {
    patterns: Vec<TopicPattern>,
    tx: mpsc::UnboundedSender<Delivery>,
}

struct State {
    available: bool,
    epoch: u64,
    connection_attempts: usize,
    listeners: Vec<Listener>,
    published: Vec<Delivery>,
}

impl State {
    fn route(&mut self, delivery: Delivery) {
        self.listeners.retain(|l| !l.tx.is_closed());

        for listener in self
            .listeners
            .iter()
            .filter(|l| l.patterns.iter().any(|p| p.matches(&delivery.routing_key)))
        {
            listener.tx.unbounded_send(delivery.clone()).ok();
        }

        self.published.push(delivery);
    }
}

/// Topic exchange shared between all clones of this handle
#[derive(Clone)]
pub struct MemoryExchange {
    state: Arc<Mutex<State>>,
}

impl Default for MemoryExchange {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                available: true,
                epoch: 0,
                connection_attempts: 0,
                listeners: Vec::new(),
                published: Vec::new(),
            })),
        }
    }
}

impl MemoryExchange {
    /// Controls whether new links are accepted
    pub fn set_available(&self, available: bool) {
        self.state().available = available;
    }

    /// Severs every established link, ending all delivery streams and failing all further publishes on them
    pub fn disconnect(&self) {
        let mut state = self.state();
        state.epoch += 1;
        state.listeners.clear();
    }

    /// Routes a payload as if it had been published by a foreign party
    pub fn inject(&self, routing_key: &str, payload: &[u8]) {
        self.state().route(Delivery {
            routing_key: routing_key.to_owned(),
            payload: payload.to_vec(),
        });
    }

    /// Number of links requested so far, including refused ones
    pub fn connection_attempts(&self) -> usize {
        self.state().connection_attempts
    }

    /// Every delivery that passed through the exchange in order
    pub fn published(&self) -> Vec<Delivery> {
        self.state().published.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BrokerTransport for MemoryExchange {
    type Link = MemoryLink;

    async fn connect(&self) -> Result<Self::Link, BoxedError> {
        let mut state = self.state();
        state.connection_attempts += 1;

        if !state.available {
            return Err(MemoryExchangeError::Unavailable.into());
        }

        Ok(MemoryLink {
            exchange: self.clone(),
            epoch: state.epoch,
        })
    }
}

/// Link to a [`MemoryExchange`] which dies on the next [`disconnect`](MemoryExchange::disconnect)
pub struct MemoryLink {
    exchange: MemoryExchange,
    epoch: u64,
}

impl MemoryLink {
    fn alive_state(&self) -> Result<MutexGuard<'_, State>, MemoryExchangeError> {
        let state = self.exchange.state();

        if state.epoch == self.epoch {
            Ok(state)
        } else {
            Err(MemoryExchangeError::Disconnected)
        }
    }
}

#[async_trait]
impl BrokerLink for MemoryLink {
    async fn publish(&self, routing_key: &str, payload: &[u8]) -> EmptyResult {
        self.alive_state()?.route(Delivery {
            routing_key: routing_key.to_owned(),
            payload: payload.to_vec(),
        });

        Ok(())
    }

    async fn listen(
        &self,
        patterns: &[TopicPattern],
    ) -> Result<BoxStream<'static, Delivery>, BoxedError> {
        let (tx, rx) = mpsc::unbounded();

        self.alive_state()?.listeners.push(Listener {
            patterns: patterns.to_vec(),
            tx,
        });

        Ok(rx.boxed())
    }
}
