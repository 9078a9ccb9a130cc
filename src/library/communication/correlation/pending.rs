use super::registry::Shared;
use super::{CorrelationError, Resolution, TimeoutPolicy};
use log::debug;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{timeout_at, Instant};

enum Progress<V> {
    Ready(V),
    Waiting {
        id: u64,
        rx: oneshot::Receiver<V>,
        deadline: Instant,
        policy: TimeoutPolicy<V>,
        shared: Arc<Shared<V>>,
    },
    Completed,
}

/// Handle to an outstanding expectation of a fact, created by a
/// [`CorrelationRegistry`](super::CorrelationRegistry)
///
/// Dropping the handle before it completed releases the key.
pub struct PendingCorrelation<V> {
    key: String,
    progress: Progress<V>,
}

impl<V> PendingCorrelation<V> {
    pub(super) fn ready(key: String, value: V) -> Self {
        Self {
            key,
            progress: Progress::Ready(value),
        }
    }

    pub(super) fn waiting(
        key: String,
        id: u64,
        rx: oneshot::Receiver<V>,
        deadline: Instant,
        policy: TimeoutPolicy<V>,
        shared: Arc<Shared<V>>,
    ) -> Self {
        Self {
            key,
            progress: Progress::Waiting {
                id,
                rx,
                deadline,
                policy,
                shared,
            },
        }
    }

    /// Normalised key this correlation is registered under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Waits for the fact to be delivered or the deadline to pass, whichever happens first
    ///
    /// The entry stays registered while waiting, so cancelling this future releases the key.
    pub async fn wait(mut self) -> Result<Resolution<V>, CorrelationError> {
        let key = self.key.clone();

        let delivery = match &mut self.progress {
            Progress::Waiting { rx, deadline, .. } => Some(timeout_at(*deadline, rx).await),
            _ => None,
        };

        match (
            std::mem::replace(&mut self.progress, Progress::Completed),
            delivery,
        ) {
            (Progress::Ready(value), _) => Ok(Resolution::Delivered(value)),
            (Progress::Waiting { .. }, Some(Ok(Ok(value)))) => Ok(Resolution::Delivered(value)),
            (
                Progress::Waiting {
                    id,
                    mut rx,
                    policy,
                    shared,
                    ..
                },
                Some(Err(_)),
            ) => {
                if !shared.evict(&key, id) {
                    // Resolver removed the entry first and has sent its value while holding the lock
                    return rx
                        .try_recv()
                        .map(Resolution::Delivered)
                        .map_err(|_| CorrelationError::Abandoned { key });
                }

                shared.statistics.timed_out.fetch_add(1, Ordering::SeqCst);

                match policy {
                    TimeoutPolicy::Fallback(value) => {
                        debug!("No fact for {} arrived in time, falling back", key);
                        Ok(Resolution::Fallback(value))
                    }
                    TimeoutPolicy::Fail => {
                        debug!("No fact for {} arrived in time", key);
                        Err(CorrelationError::TimedOut { key })
                    }
                }
            }
            _ => Err(CorrelationError::Abandoned { key }),
        }
    }
}

impl<V> Drop for PendingCorrelation<V> {
    fn drop(&mut self) {
        if let Progress::Waiting { id, shared, .. } = &self.progress {
            if shared.evict(&self.key, *id) {
                debug!("Released abandoned correlation for {}", self.key);
            }
        }
    }
}
