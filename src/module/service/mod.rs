//! Backend services answering searches about one kind of subject each
//!
//! Both roles are the same [`SubjectService`] parametrised with a [`LookupSaga`]. A role answers a
//! search by requesting one detail from its peer and joining it with a second detail that the peer
//! publishes onto the topic exchange while answering. At the same time it serves the requests of its
//! peer and publishes facts in return.

use crate::domain::StaticDirectory;
use crate::harness::{BrokerSupervisorJob, Heart, Module, QueueConsumerJob};
use crate::library::communication::broker::BrokerConnection;
use crate::library::communication::correlation::{CorrelationRegistry, TimeoutPolicy};
use crate::library::communication::event::{Notification, QueueBinding};
use crate::library::communication::implementation::http::HttpRequestor;
use crate::library::communication::implementation::redis::RedisTransport;
use crate::library::communication::request::Request;
use crate::library::BoxedError;
use crate::module::options::TimeoutBehaviour;
use async_trait::async_trait;
use jatsl::{schedule, JobScheduler};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::info;

mod consumer;
mod options;
mod processor;
mod responder;
mod saga;
mod server;

pub use consumer::FactConsumer;
pub use options::Options;
pub use processor::{ClientWealthProcessor, CompanyValuationProcessor};
pub use responder::SearchResponder;
pub use saga::*;
pub use server::ServiceServerJob;

/// Service answering client searches
pub type ClientService = SubjectService<ClientSaga>;

/// Service answering company searches
pub type CompanyService = SubjectService<CompanySaga>;

/// Module implementation
pub struct SubjectService<S> {
    options: Options,
    saga: PhantomData<fn() -> S>,
}

impl<S: LookupSaga> SubjectService<S> {
    /// Creates a new instance from raw parts
    pub fn new(options: Options) -> Self {
        Self {
            options,
            saga: PhantomData,
        }
    }

    fn timeout_policy(&self) -> TimeoutPolicy<String> {
        let correlation = &self.options.correlation;

        match correlation.on_timeout.unwrap_or(S::DEFAULT_ON_TIMEOUT) {
            TimeoutBehaviour::Fail => TimeoutPolicy::Fail,
            TimeoutBehaviour::Fallback => {
                TimeoutPolicy::Fallback(correlation.fallback_value.clone())
            }
        }
    }
}

#[async_trait]
impl<S> Module for SubjectService<S>
where
    S: LookupSaga,
    <S::Request as Request>::Response: Send + Sync,
{
    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        let port = self.options.http.port.unwrap_or(S::DEFAULT_PORT);
        let peer = self
            .options
            .peer
            .clone()
            .unwrap_or_else(|| S::DEFAULT_PEER.to_owned());
        let policy = self.timeout_policy();
        let correlation = &self.options.correlation;

        info!(port, %peer, ?policy, "Starting {}", S::SERVICE_NAME);

        // Build all the required data structures
        let connection = BrokerConnection::new(RedisTransport::new(&self.options.broker.url)?);
        let directory = StaticDirectory::seeded();
        let registry =
            CorrelationRegistry::new(correlation.early_fact_capacity, correlation.early_fact_ttl);
        let coordinator = SagaCoordinator::<S, _, _>::new(
            directory.clone(),
            HttpRequestor::new(peer),
            registry.clone(),
            correlation.timeout,
            policy,
        )
        .with_request_timeout(self.options.rpc_timeout);

        // Create individual jobs
        let broker_job = BrokerSupervisorJob::new(connection.clone());
        let consumer_job = QueueConsumerJob::new(
            FactConsumer::<S::Fact>::new(registry),
            connection.clone(),
            QueueBinding::new(S::QUEUE, S::Fact::topic().binding()),
        );
        let server_job = ServiceServerJob::new(
            port,
            Arc::new(coordinator),
            S::peer_router(directory, connection),
        );

        // Schedule everything
        schedule!(scheduler, {
            broker_job,
            consumer_job,
            server_job
        });

        Ok(Some(Heart::without_heart_stone()))
    }
}
