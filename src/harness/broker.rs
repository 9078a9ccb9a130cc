use crate::library::communication::broker::{BrokerConnection, BrokerTransport};
use crate::library::EmptyResult;
use async_trait::async_trait;
use jatsl::{Job, JobManager};
use tokio::select;
use tracing::info;

/// Job which keeps a [`BrokerConnection`] alive
///
/// The job reports readiness right away, publishing fails fast until the first link is established.
pub struct BrokerSupervisorJob<T: BrokerTransport> {
    connection: BrokerConnection<T>,
}

impl<T: BrokerTransport> BrokerSupervisorJob<T> {
    /// Creates a new job supervising the given connection
    pub fn new(connection: BrokerConnection<T>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl<T: BrokerTransport> Job for BrokerSupervisorJob<T> {
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        manager.ready().await;

        select! {
            _ = self.connection.supervise() => {},
            _ = manager.termination_signal() => info!("Broker supervisor terminated"),
        }

        Ok(())
    }
}
