use super::{normalise, CorrelationError, PendingCorrelation, TimeoutPolicy};
use log::{debug, trace};
use lru::LruCache;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Default number of facts kept while no matching correlation is pending
pub const DEFAULT_EARLY_FACT_CAPACITY: usize = 1024;

/// Default time after which a buffered fact is considered stale
pub const DEFAULT_EARLY_FACT_TTL: Duration = Duration::from_secs(5);

pub(super) struct Entry<V> {
    pub(super) id: u64,
    pub(super) tx: oneshot::Sender<V>,
}

struct BufferedFact<V> {
    value: V,
    received: Instant,
}

pub(super) struct State<V> {
    pub(super) pending: HashMap<String, Entry<V>>,
    early: Option<LruCache<String, BufferedFact<V>>>,
    next_id: u64,
}

pub(super) struct Shared<V> {
    state: Mutex<State<V>>,
    early_fact_ttl: Duration,
    pub(super) statistics: CorrelationStatistics,
}

impl<V> Shared<V> {
    pub(super) fn state(&self) -> MutexGuard<'_, State<V>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Removes the entry for `key` if it still belongs to the correlation identified by `id`
    pub(super) fn evict(&self, key: &str, id: u64) -> bool {
        let mut state = self.state();

        match state.pending.get(key) {
            Some(entry) if entry.id == id => {
                state.pending.remove(key);
                true
            }
            _ => false,
        }
    }
}

/// Counters describing the activity of a [`CorrelationRegistry`]
#[derive(Debug, Default)]
pub struct CorrelationStatistics {
    pub(super) registered: AtomicUsize,
    pub(super) resolved: AtomicUsize,
    pub(super) timed_out: AtomicUsize,
    pub(super) buffered: AtomicUsize,
    pub(super) dropped: AtomicUsize,
}

impl CorrelationStatistics {
    /// Number of successful registrations
    pub fn registered(&self) -> usize {
        self.registered.load(Ordering::SeqCst)
    }

    /// Number of correlations completed with a delivered fact (including buffered ones)
    pub fn resolved(&self) -> usize {
        self.resolved.load(Ordering::SeqCst)
    }

    /// Number of correlations whose deadline passed
    pub fn timed_out(&self) -> usize {
        self.timed_out.load(Ordering::SeqCst)
    }

    /// Number of facts that arrived while no matching correlation was pending
    pub fn buffered(&self) -> usize {
        self.buffered.load(Ordering::SeqCst)
    }

    /// Number of facts discarded without ever being delivered
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }
}

/// Table of pending correlations shared between sagas and fact consumers
///
/// Cloning is cheap and every clone refers to the same table. All mutations happen while holding
/// a single lock which makes the removal of an entry the one point deciding between delivery and
/// timeout.
pub struct CorrelationRegistry<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for CorrelationRegistry<V> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<V> Default for CorrelationRegistry<V> {
    fn default() -> Self {
        Self::new(DEFAULT_EARLY_FACT_CAPACITY, DEFAULT_EARLY_FACT_TTL)
    }
}

impl<V> CorrelationRegistry<V> {
    /// Creates an empty registry which buffers up to `early_fact_capacity` unmatched facts for `early_fact_ttl`.
    ///
    /// A capacity of zero disables buffering, unmatched facts are dropped right away.
    pub fn new(early_fact_capacity: usize, early_fact_ttl: Duration) -> Self {
        let early = if early_fact_capacity > 0 {
            Some(LruCache::new(early_fact_capacity))
        } else {
            None
        };

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    pending: HashMap::new(),
                    early,
                    next_id: 0,
                }),
                early_fact_ttl,
                statistics: CorrelationStatistics::default(),
            }),
        }
    }

    /// Activity counters
    pub fn statistics(&self) -> &CorrelationStatistics {
        &self.shared.statistics
    }

    /// Number of correlations currently awaiting a fact
    pub fn pending(&self) -> usize {
        self.shared.state().pending.len()
    }

    /// Fails with [`CorrelationError::AlreadyPending`] while a correlation for `key` is outstanding
    ///
    /// Lets callers refuse work before triggering the fact, the key is not reserved though.
    pub fn ensure_vacant(&self, key: &str) -> Result<(), CorrelationError> {
        let key = normalise(key);

        if self.shared.state().pending.contains_key(&key) {
            Err(CorrelationError::AlreadyPending { key })
        } else {
            Ok(())
        }
    }

    /// Registers interest in a fact about `key` which has to arrive within `timeout`
    ///
    /// When a fresh fact for the key has been buffered already, the returned handle completes right
    /// away. Registering a key that is still pending fails with [`CorrelationError::AlreadyPending`].
    pub fn register(
        &self,
        key: &str,
        timeout: Duration,
        policy: TimeoutPolicy<V>,
    ) -> Result<PendingCorrelation<V>, CorrelationError> {
        let key = normalise(key);
        let mut state = self.shared.state();

        if state.pending.contains_key(&key) {
            return Err(CorrelationError::AlreadyPending { key });
        }

        self.shared
            .statistics
            .registered
            .fetch_add(1, Ordering::SeqCst);

        let buffered = state.early.as_mut().and_then(|early| early.pop(&key));
        if let Some(fact) = buffered {
            if fact.received.elapsed() <= self.shared.early_fact_ttl {
                debug!("Picked up buffered fact for {}", key);
                self.shared.statistics.resolved.fetch_add(1, Ordering::SeqCst);
                return Ok(PendingCorrelation::ready(key, fact.value));
            }

            trace!("Discarding stale buffered fact for {}", key);
            self.shared.statistics.dropped.fetch_add(1, Ordering::SeqCst);
        }

        let (tx, rx) = oneshot::channel();
        let id = state.next_id;
        state.next_id += 1;
        state.pending.insert(key.clone(), Entry { id, tx });

        Ok(PendingCorrelation::waiting(
            key,
            id,
            rx,
            Instant::now() + timeout,
            policy,
            self.shared.clone(),
        ))
    }

    /// Delivers a fact about `key` and returns whether a pending correlation has been completed by it
    ///
    /// Unmatched facts are buffered for a later registration of the same key (if enabled) and are
    /// never an error. Delivering a fact for a key whose correlation already completed has no effect
    /// on that correlation.
    pub fn resolve(&self, key: &str, value: V) -> bool {
        let key = normalise(key);
        let mut state = self.shared.state();

        let value = match state.pending.remove(&key) {
            Some(entry) => match entry.tx.send(value) {
                Ok(()) => {
                    self.shared.statistics.resolved.fetch_add(1, Ordering::SeqCst);
                    return true;
                }
                Err(value) => value,
            },
            None => value,
        };

        match state.early.as_mut() {
            Some(early) => {
                if early.len() == early.cap() && !early.contains(&key) {
                    self.shared.statistics.dropped.fetch_add(1, Ordering::SeqCst);
                }

                trace!("Buffering unmatched fact for {}", key);
                early.put(
                    key,
                    BufferedFact {
                        value,
                        received: Instant::now(),
                    },
                );
                self.shared.statistics.buffered.fetch_add(1, Ordering::SeqCst);
            }
            None => {
                debug!("Dropping unmatched fact for {}", key);
                self.shared.statistics.dropped.fetch_add(1, Ordering::SeqCst);
            }
        }

        false
    }
}

#[cfg(test)]
mod does {
    use super::super::{CorrelationError, Resolution, TimeoutPolicy};
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::time::sleep;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn registry() -> CorrelationRegistry<String> {
        CorrelationRegistry::default()
    }

    fn unbuffered() -> CorrelationRegistry<String> {
        CorrelationRegistry::new(0, DEFAULT_EARLY_FACT_TTL)
    }

    #[tokio::test(start_paused = true)]
    async fn deliver_a_resolved_value_exactly_once() {
        let registry = registry();
        let pending = registry
            .register("Elon Musk", TIMEOUT, TimeoutPolicy::Fail)
            .unwrap();

        assert!(registry.resolve("Elon Musk", "CEO".into()));
        assert!(!registry.resolve("Elon Musk", "CTO".into()));

        assert_eq!(
            pending.wait().await,
            Ok(Resolution::Delivered("CEO".to_owned()))
        );
        assert_eq!(registry.statistics().resolved(), 1);
        assert_eq!(registry.statistics().timed_out(), 0);
        assert_eq!(registry.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fall_back_at_the_deadline_and_not_before() {
        let registry = registry();
        let pending = registry
            .register("Tesla", TIMEOUT, TimeoutPolicy::Fallback("Unknown".into()))
            .unwrap();

        let started = Instant::now();
        let resolution = pending.wait().await;

        assert!(started.elapsed() >= TIMEOUT);
        assert_eq!(resolution, Ok(Resolution::Fallback("Unknown".to_owned())));
        assert_eq!(registry.statistics().timed_out(), 1);
        assert_eq!(registry.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fail_at_the_deadline_when_asked_to() {
        let registry = registry();
        let pending = registry
            .register("Elon Musk", TIMEOUT, TimeoutPolicy::Fail)
            .unwrap();

        assert_eq!(
            pending.wait().await,
            Err(CorrelationError::TimedOut {
                key: "elon musk".into()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ignore_facts_after_the_deadline() {
        let registry = unbuffered();
        let pending = registry
            .register("Tesla", TIMEOUT, TimeoutPolicy::Fallback("Unknown".into()))
            .unwrap();

        assert!(!pending.wait().await.unwrap().is_delivered());
        assert!(!registry.resolve("Tesla", "25,000".into()));
        assert_eq!(registry.statistics().dropped(), 1);
    }

    #[tokio::test]
    async fn match_keys_case_insensitively() {
        let registry = registry();
        let pending = registry
            .register("Elon Musk", TIMEOUT, TimeoutPolicy::Fail)
            .unwrap();

        assert!(registry.resolve("elon musk", "CEO".into()));
        assert_eq!(pending.wait().await.unwrap().into_value(), "CEO");
    }

    #[tokio::test]
    async fn reject_duplicate_registrations() {
        let registry = registry();
        let _first = registry
            .register("Tesla", TIMEOUT, TimeoutPolicy::Fail)
            .unwrap();

        assert!(matches!(
            registry.register("TESLA", TIMEOUT, TimeoutPolicy::Fail),
            Err(CorrelationError::AlreadyPending { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn pick_up_facts_that_arrived_early() {
        let registry = registry();

        assert!(!registry.resolve("Tesla", "25,000".into()));
        sleep(Duration::from_secs(1)).await;

        let pending = registry
            .register("tesla", TIMEOUT, TimeoutPolicy::Fail)
            .unwrap();

        assert_eq!(
            pending.wait().await,
            Ok(Resolution::Delivered("25,000".to_owned()))
        );
        assert_eq!(registry.statistics().buffered(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn discard_stale_early_facts() {
        let registry = registry();

        registry.resolve("Tesla", "25,000".into());
        sleep(DEFAULT_EARLY_FACT_TTL + Duration::from_millis(1)).await;

        let pending = registry
            .register("Tesla", TIMEOUT, TimeoutPolicy::Fallback("Unknown".into()))
            .unwrap();

        assert_eq!(
            pending.wait().await,
            Ok(Resolution::Fallback("Unknown".to_owned()))
        );
        assert_eq!(registry.statistics().dropped(), 1);
    }

    #[tokio::test]
    async fn evict_entries_of_dropped_handles() {
        let registry = unbuffered();
        let pending = registry
            .register("Tesla", TIMEOUT, TimeoutPolicy::Fail)
            .unwrap();
        assert_eq!(registry.pending(), 1);

        drop(pending);

        assert_eq!(registry.pending(), 0);
        assert!(!registry.resolve("Tesla", "25,000".into()));
        assert!(registry
            .register("Tesla", TIMEOUT, TimeoutPolicy::Fail)
            .is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn release_keys_of_cancelled_waits() {
        let registry = unbuffered();
        let pending = registry
            .register("Tesla", TIMEOUT, TimeoutPolicy::Fail)
            .unwrap();

        let cancelled = tokio::time::timeout(Duration::from_secs(1), pending.wait()).await;

        assert!(cancelled.is_err());
        assert_eq!(registry.pending(), 0);
        assert!(registry
            .register("Tesla", TIMEOUT, TimeoutPolicy::Fail)
            .is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn complete_concurrent_correlations_independently() {
        let registry = registry();
        let client = registry
            .register("Elon Musk", TIMEOUT, TimeoutPolicy::Fail)
            .unwrap();
        let company = registry
            .register("Tesla", TIMEOUT, TimeoutPolicy::Fallback("Unknown".into()))
            .unwrap();

        let resolver = registry.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(1)).await;
            resolver.resolve("ELON MUSK", "CEO".into());
        });

        let (client, company) = futures::join!(client.wait(), company.wait());

        assert_eq!(client, Ok(Resolution::Delivered("CEO".to_owned())));
        assert_eq!(company, Ok(Resolution::Fallback("Unknown".to_owned())));
    }
}
