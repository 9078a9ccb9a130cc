use super::{OptionalRequestProcessor, RawRequestProcessor, Request, ResponderError};
use std::collections::HashMap;
use std::sync::Arc;

type SharedProcessor = Arc<dyn RawRequestProcessor + Send + Sync>;

/// Dispatches serialized requests to processors by [`Request::PATH`]
#[derive(Clone, Default)]
pub struct RequestRouter {
    routes: HashMap<&'static str, SharedProcessor>,
}

impl RequestRouter {
    /// Mounts a processor at the path of the request it processes, replacing any previous one
    pub fn with_processor<P>(mut self, processor: P) -> Self
    where
        P: OptionalRequestProcessor + RawRequestProcessor + Send + Sync + 'static,
    {
        self.routes.insert(
            <P::Request as Request>::PATH,
            Arc::new(processor) as SharedProcessor,
        );
        self
    }

    /// Whether a processor is mounted at the given path
    pub fn serves(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    /// Hands the payload to the processor mounted at `path`
    ///
    /// Returns `None` when nothing is mounted there.
    pub async fn dispatch(
        &self,
        path: &str,
        payload: &[u8],
    ) -> Option<Result<Option<Vec<u8>>, ResponderError>> {
        let processor = self.routes.get(path)?.clone();
        Some(processor.process_raw(payload).await)
    }
}
