use super::super::super::request::{Request, RequestError, RequestRouter, Requestor, ResponderError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

#[derive(Debug, Error)]
enum LocalRequestorError {
    #[error("peer has been marked as unreachable")]
    Unreachable,
    #[error("no processor mounted at {0}")]
    NoRoute(&'static str),
}

/// [`Requestor`] which hands requests to a [`RequestRouter`] within the same process
///
/// Requests still pass through serialization so that both sides see exactly what they would see on the wire.
#[derive(Clone)]
pub struct LocalRequestor {
    router: RequestRouter,
    latency: Option<Duration>,
    reachable: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl LocalRequestor {
    /// Creates a new instance sending requests to the given router
    pub fn new(router: RequestRouter) -> Self {
        Self {
            router,
            latency: None,
            reachable: Arc::new(AtomicBool::new(true)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delays every response by the given duration
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Controls whether requests reach the router or fail as if the peer was down
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Number of requests issued so far, including failed ones
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Requestor for LocalRequestor {
    async fn request<R>(&self, request: &R) -> Result<R::Response, RequestError>
    where
        R: Request + Send + Sync,
        R::Response: Send + Sync,
    {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.reachable.load(Ordering::SeqCst) {
            return Err(RequestError::Unreachable(
                LocalRequestorError::Unreachable.into(),
            ));
        }

        let payload =
            serde_json::to_vec(request).map_err(|e| RequestError::EncodingFailed(e.into()))?;

        let result = self
            .router
            .dispatch(R::PATH, &payload)
            .await
            .ok_or_else(|| RequestError::Unreachable(LocalRequestorError::NoRoute(R::PATH).into()))?;

        if let Some(latency) = self.latency {
            sleep(latency).await;
        }

        match result {
            Ok(Some(response)) => serde_json::from_slice(&response)
                .map_err(|e| RequestError::ReceptionFailed(e.into())),
            Ok(None) => Err(RequestError::NotFound),
            Err(ResponderError::MalformedRequest(_)) => Err(RequestError::UnexpectedStatus(400)),
            Err(_) => Err(RequestError::UnexpectedStatus(500)),
        }
    }
}
