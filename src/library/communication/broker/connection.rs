use super::super::super::helpers::Backoff;
use super::super::super::{BoxedError, EmptyResult};
use super::super::event::{QueueBinding, QueueProvider, RawNotificationPublisher, TopicPattern};
use super::super::implementation::json::JsonNotificationPublisher;
use super::{BrokerError, BrokerLink, BrokerQueueEntry, BrokerTransport, Delivery};
use async_trait::async_trait;
use futures::channel::mpsc;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{watch, Notify, RwLock};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

struct Subscription {
    binding: QueueBinding,
    tx: mpsc::UnboundedSender<Delivery>,
    acknowledged: Arc<AtomicUsize>,
}

/// Counters describing the activity of a [`BrokerConnection`]
#[derive(Debug, Default)]
pub struct BrokerStatistics {
    connection_attempts: AtomicUsize,
    connections: AtomicUsize,
    published: AtomicUsize,
    delivered: AtomicUsize,
    unroutable: AtomicUsize,
}

impl BrokerStatistics {
    /// Number of times a link has been requested from the transport
    pub fn connection_attempts(&self) -> usize {
        self.connection_attempts.load(Ordering::SeqCst)
    }

    /// Number of links that have been established successfully
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Number of payloads published successfully
    pub fn published(&self) -> usize {
        self.published.load(Ordering::SeqCst)
    }

    /// Number of deliveries routed to at least one bound queue
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }

    /// Number of deliveries no bound queue was interested in
    pub fn unroutable(&self) -> usize {
        self.unroutable.load(Ordering::SeqCst)
    }
}

struct Inner<T: BrokerTransport> {
    transport: T,
    backoff: Backoff,
    link: RwLock<Option<Arc<T::Link>>>,
    subscriptions: Mutex<Vec<Subscription>>,
    bindings_changed: Notify,
    link_invalidated: Notify,
    connected_tx: watch::Sender<bool>,
    connected_rx: watch::Receiver<bool>,
    statistics: BrokerStatistics,
}

/// Shared, self-healing connection to the topic exchange
///
/// Cloning is cheap and every clone refers to the same link, bindings and statistics.
pub struct BrokerConnection<T: BrokerTransport> {
    inner: Arc<Inner<T>>,
}

impl<T: BrokerTransport> Clone for BrokerConnection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: BrokerTransport> BrokerConnection<T> {
    /// Creates a new, not yet connected instance using the default reconnect [`Backoff`]
    pub fn new(transport: T) -> Self {
        Self::with_backoff(transport, Backoff::default())
    }

    /// Creates a new, not yet connected instance which waits according to `backoff` between connection attempts
    pub fn with_backoff(transport: T, backoff: Backoff) -> Self {
        let (connected_tx, connected_rx) = watch::channel(false);

        Self {
            inner: Arc::new(Inner {
                transport,
                backoff,
                link: RwLock::new(None),
                subscriptions: Mutex::new(Vec::new()),
                bindings_changed: Notify::new(),
                link_invalidated: Notify::new(),
                connected_tx,
                connected_rx,
                statistics: BrokerStatistics::default(),
            }),
        }
    }

    /// Activity counters
    pub fn statistics(&self) -> &BrokerStatistics {
        &self.inner.statistics
    }

    /// Whether a live link is currently available
    pub fn is_connected(&self) -> bool {
        *self.inner.connected_rx.borrow()
    }

    /// Waits until a live link is available
    pub async fn wait_until_connected(&self) {
        let mut rx = self.inner.connected_rx.clone();

        loop {
            let connected = *rx.borrow();

            if connected || rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Publishes a payload on the current link
    ///
    /// Fails immediately with [`BrokerError::Unavailable`] when there is no live link instead of
    /// waiting for one. A failing link is handed back to the supervisor for reconnection.
    pub async fn publish(&self, routing_key: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let link = self.inner.link.read().await.clone();
        let link = link.ok_or(BrokerError::Unavailable)?;

        match link.publish(routing_key, payload).await {
            Ok(()) => {
                self.inner
                    .statistics
                    .published
                    .fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Err(error) => {
                warn!(routing_key, %error, "Publishing failed, dropping broker link");
                self.invalidate(&link).await;
                Err(BrokerError::PublishFailed(error))
            }
        }
    }

    /// Binds a queue to the exchange and returns a stream of its entries
    ///
    /// The binding is re-asserted on every reconnect. It is released when the returned stream is dropped.
    pub fn bind(&self, binding: QueueBinding) -> BoxStream<'static, BrokerQueueEntry> {
        let (tx, rx) = mpsc::unbounded();
        let acknowledged = Arc::new(AtomicUsize::new(0));
        let entry_acknowledged = acknowledged.clone();

        debug!(queue = binding.queue(), pattern = %binding.pattern(), "Binding queue");

        self.subscriptions().push(Subscription {
            binding,
            tx,
            acknowledged,
        });
        self.inner.bindings_changed.notify_one();

        rx.map(move |delivery| BrokerQueueEntry::new(delivery, entry_acknowledged.clone()))
            .boxed()
    }

    /// Number of entries acknowledged on all live bindings of the named queue
    pub fn acknowledged(&self, queue: &str) -> usize {
        self.subscriptions()
            .iter()
            .filter(|s| s.binding.queue() == queue)
            .map(|s| s.acknowledged.load(Ordering::SeqCst))
            .sum()
    }

    /// Keeps the link to the broker alive, never returns
    ///
    /// Connects, asserts all bindings and routes deliveries until the link dies. Afterwards it waits
    /// for the next delay of the configured [`Backoff`] and tries again, indefinitely. The backoff is
    /// reset after every successful connection.
    #[instrument(skip(self))]
    pub async fn supervise(&self) {
        let mut backoff = self.inner.backoff.clone();

        loop {
            let attempt = self
                .inner
                .statistics
                .connection_attempts
                .fetch_add(1, Ordering::SeqCst)
                + 1;

            debug!(attempt, "Connecting to broker");

            match self.inner.transport.connect().await {
                Ok(link) => {
                    let link = Arc::new(link);
                    backoff.reset();

                    self.inner.statistics.connections.fetch_add(1, Ordering::SeqCst);
                    *self.inner.link.write().await = Some(link.clone());
                    self.inner.connected_tx.send(true).ok();
                    info!(attempt, "Connected to broker");

                    let reason = self.serve(&link).await;
                    self.invalidate(&link).await;
                    warn!(%reason, "Lost connection to broker");
                }
                Err(error) => warn!(attempt, %error, "Failed to connect to broker"),
            }

            let delay = backoff
                .next()
                .or_else(|| {
                    backoff.reset();
                    backoff.next()
                })
                .unwrap_or_else(|| Duration::from_secs(1));

            info!(?delay, "Reconnecting to broker after delay");
            sleep(delay).await;
        }
    }

    async fn serve(&self, link: &Arc<T::Link>) -> String {
        loop {
            let patterns = self.patterns();

            let mut deliveries = match link.listen(&patterns).await {
                Ok(deliveries) => deliveries,
                Err(e) => return format!("unable to assert bindings: {}", e),
            };

            debug!(bindings = patterns.len(), "Asserted queue bindings");

            loop {
                tokio::select! {
                    delivery = deliveries.next() => match delivery {
                        Some(delivery) => self.route(delivery),
                        None => return "delivery stream ended".into(),
                    },
                    _ = self.inner.bindings_changed.notified() => break,
                    _ = self.inner.link_invalidated.notified() => {
                        if !self.is_current(link).await {
                            return "link failed while publishing".into();
                        }
                    }
                }
            }
        }
    }

    fn route(&self, delivery: Delivery) {
        let mut subscriptions = self.subscriptions();
        subscriptions.retain(|s| !s.tx.is_closed());

        let mut routed = false;
        for subscription in subscriptions
            .iter()
            .filter(|s| s.binding.pattern().matches(&delivery.routing_key))
        {
            routed |= subscription.tx.unbounded_send(delivery.clone()).is_ok();
        }

        if routed {
            self.inner.statistics.delivered.fetch_add(1, Ordering::SeqCst);
        } else {
            debug!(routing_key = %delivery.routing_key, "No binding matched delivery");
            self.inner.statistics.unroutable.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn patterns(&self) -> Vec<TopicPattern> {
        let mut subscriptions = self.subscriptions();
        subscriptions.retain(|s| !s.tx.is_closed());

        let mut patterns: Vec<TopicPattern> = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions.iter() {
            if !patterns.contains(subscription.binding.pattern()) {
                patterns.push(subscription.binding.pattern().clone());
            }
        }

        patterns
    }

    async fn is_current(&self, link: &Arc<T::Link>) -> bool {
        self.inner
            .link
            .read()
            .await
            .as_ref()
            .map(|current| Arc::ptr_eq(current, link))
            .unwrap_or(false)
    }

    async fn invalidate(&self, link: &Arc<T::Link>) {
        let mut current = self.inner.link.write().await;

        if current
            .as_ref()
            .map(|c| Arc::ptr_eq(c, link))
            .unwrap_or(false)
        {
            *current = None;
            self.inner.connected_tx.send(false).ok();
            self.inner.link_invalidated.notify_one();
        }
    }

    fn subscriptions(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.inner
            .subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl<T: BrokerTransport> QueueProvider for BrokerConnection<T> {
    type Entry = BrokerQueueEntry;

    async fn consume(
        &self,
        binding: QueueBinding,
    ) -> Result<BoxStream<'static, Self::Entry>, BoxedError> {
        Ok(self.bind(binding))
    }
}

#[async_trait]
impl<T: BrokerTransport> RawNotificationPublisher for BrokerConnection<T> {
    async fn publish_raw(&self, data: &[u8], routing_key: &str) -> EmptyResult {
        self.publish(routing_key, data).await.map_err(Into::into)
    }
}

impl<T: BrokerTransport> JsonNotificationPublisher for BrokerConnection<T> {}

#[cfg(test)]
mod does {
    use super::super::super::event::RawQueueEntry;
    use super::super::super::implementation::memory::MemoryExchange;
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::task::yield_now;

    fn fixed_backoff() -> Backoff {
        Backoff::unbounded(Duration::from_secs(1), Duration::from_secs(1)).with_jitter(0.0)
    }

    fn client_binding() -> QueueBinding {
        QueueBinding::new("client_details", TopicPattern::new("client.details.#"))
    }

    async fn connected(exchange: &MemoryExchange) -> BrokerConnection<MemoryExchange> {
        let connection = BrokerConnection::with_backoff(exchange.clone(), fixed_backoff());
        let supervisor = connection.clone();
        tokio::spawn(async move { supervisor.supervise().await });
        connection.wait_until_connected().await;
        connection
    }

    #[tokio::test]
    async fn fail_fast_without_link() {
        let connection = BrokerConnection::new(MemoryExchange::default());

        match connection.publish("client.details.x", b"{}").await {
            Err(BrokerError::Unavailable) => {}
            other => panic!("expected broker to be unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn route_only_to_matching_bindings() {
        let exchange = MemoryExchange::default();
        let connection = connected(&exchange).await;

        let mut clients = connection.bind(client_binding());
        let mut companies = connection.bind(QueueBinding::new(
            "company_details",
            TopicPattern::new("company.details.#"),
        ));
        yield_now().await;

        connection
            .publish("company.details.tesla", b"tesla")
            .await
            .unwrap();
        connection
            .publish("client.details.elonmusk", b"elon")
            .await
            .unwrap();

        let company = companies.next().await.unwrap();
        let client = clients.next().await.unwrap();

        assert_eq!(company.payload(), b"tesla");
        assert_eq!(client.payload(), b"elon");
        assert_eq!(connection.statistics().published(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_once_per_backoff_interval() {
        let exchange = MemoryExchange::default();
        let connection = connected(&exchange).await;
        assert_eq!(connection.statistics().connection_attempts(), 1);

        exchange.set_available(false);
        exchange.disconnect();

        sleep(Duration::from_millis(3_500)).await;

        assert!(!connection.is_connected());
        assert_eq!(connection.statistics().connection_attempts(), 4);
        assert_eq!(exchange.connection_attempts(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn restore_bindings_after_reconnect() {
        let exchange = MemoryExchange::default();
        let connection = connected(&exchange).await;
        let mut clients = connection.bind(client_binding());
        yield_now().await;

        exchange.set_available(false);
        exchange.disconnect();
        sleep(Duration::from_millis(1_500)).await;

        assert!(matches!(
            connection.publish("client.details.elonmusk", b"lost").await,
            Err(BrokerError::Unavailable)
        ));

        exchange.set_available(true);
        connection.wait_until_connected().await;
        yield_now().await;

        connection
            .publish("client.details.elonmusk", b"restored")
            .await
            .unwrap();

        let entry = clients.next().await.unwrap();
        assert_eq!(entry.payload(), b"restored");
        assert_eq!(connection.statistics().connections(), 2);
    }

    #[tokio::test]
    async fn count_acknowledgements_per_queue() {
        let exchange = MemoryExchange::default();
        let connection = connected(&exchange).await;
        let mut clients = connection.bind(client_binding());
        yield_now().await;

        connection.publish("client.details.a", b"a").await.unwrap();
        let mut entry = clients.next().await.unwrap();
        entry.acknowledge().await.unwrap();
        entry.acknowledge().await.unwrap();

        assert_eq!(connection.acknowledged("client_details"), 1);
    }
}
