use super::responder::SearchResponder;
use super::saga::{LookupSaga, SagaCoordinator};
use crate::domain::SubjectDirectory;
use crate::library::communication::implementation::http::RequestRouterResponder;
use crate::library::communication::request::{Request, RequestRouter, Requestor};
use crate::library::http::HealthResponder;
use crate::library::EmptyResult;
use crate::make_responder_chain_service_fn;
use async_trait::async_trait;
use hyper::Server;
use jatsl::{Job, JobManager};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// HTTP listener answering searches, peer requests and health checks of one service role
pub struct ServiceServerJob<S, D, R> {
    port: u16,
    coordinator: Arc<SagaCoordinator<S, D, R>>,
    router: RequestRouter,
}

impl<S, D, R> ServiceServerJob<S, D, R> {
    /// Creates a new instance from raw parts
    pub fn new(port: u16, coordinator: Arc<SagaCoordinator<S, D, R>>, router: RequestRouter) -> Self {
        Self {
            port,
            coordinator,
            router,
        }
    }
}

#[async_trait]
impl<S, D, R> Job for ServiceServerJob<S, D, R>
where
    S: LookupSaga,
    D: SubjectDirectory + Send + Sync + 'static,
    R: Requestor + Send + Sync + 'static,
    <S::Request as Request>::Response: Send + Sync,
{
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let health = HealthResponder::new(
            format!("{} is running", S::SERVICE_NAME),
            format!("{} is healthy", S::SERVICE_NAME),
        );
        let search = SearchResponder::new(self.coordinator.clone());
        let rpc = RequestRouterResponder::new(self.router.clone());

        let make_svc = make_responder_chain_service_fn! {
            health,
            search,
            rpc
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let server = Server::try_bind(&addr)?.serve(make_svc);
        let graceful = server.with_graceful_shutdown(manager.termination_signal());

        info!(port = self.port, "{} listening", S::SERVICE_NAME);
        manager.ready().await;
        graceful.await?;

        Ok(())
    }
}
