use super::processor::{ClientWealthProcessor, CompanyValuationProcessor};
use crate::constants::{PORT_CLIENT_SERVICE, PORT_COMPANY_SERVICE};
use crate::domain::event::{ClientFunctionNotification, CompanyHeadcountNotification, DetailFact};
use crate::domain::request::{ClientWealthRequest, CompanyValuationRequest};
use crate::domain::search::{
    ClientDetails, CompanyDetails, SearchRequest, SearchValidationError, SubjectNotFound,
};
use crate::domain::{ClientRecord, CompanyRecord, SubjectDirectory, SubjectKind};
use crate::library::communication::correlation::{
    CorrelationError, CorrelationRegistry, TimeoutPolicy,
};
use crate::library::communication::event::NotificationPublisher;
use crate::library::communication::request::{Request, RequestError, RequestRouter, Requestor};
use crate::module::options::TimeoutBehaviour;
use serde::Serialize;
use std::marker::PhantomData;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Time a peer gets to answer a request unless configured otherwise
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Describes how one service role answers searches about its [`SubjectKind`]
///
/// The role asks its peer for one part of the answer over RPC while the other part is delivered as a
/// [`DetailFact`] that the peer publishes when answering. In return, each role serves the RPC its peer
/// issues, see [`peer_router`](LookupSaga::peer_router).
pub trait LookupSaga: Send + Sync + 'static {
    /// Kind of subject searched for
    const KIND: SubjectKind;
    /// Human readable name of the service role
    const SERVICE_NAME: &'static str;
    /// Queue on which the facts of this role are consumed
    const QUEUE: &'static str;
    /// Port the role listens on unless configured otherwise
    const DEFAULT_PORT: u16;
    /// Peer base URL unless configured otherwise
    const DEFAULT_PEER: &'static str;
    /// Timeout behaviour unless configured otherwise
    const DEFAULT_ON_TIMEOUT: TimeoutBehaviour;
    /// Message reported alongside failures
    const FAILURE_MESSAGE: &'static str;

    /// Locally known data about a subject
    type Record: Send + Sync;
    /// Request sent to the peer
    type Request: Request + Send + Sync;
    /// Fact published by the peer
    type Fact: DetailFact + Send + Sync + 'static;
    /// Combined answer
    type Details: Serialize + Send + Sync;

    /// Looks up the subject in the local data
    fn lookup<D: SubjectDirectory>(directory: &D, name: &str) -> Option<Self::Record>;

    /// Canonical name of a subject which is used as correlation key
    fn name(record: &Self::Record) -> &str;

    /// Builds the request to send to the peer
    fn request(record: &Self::Record) -> Self::Request;

    /// Joins both halves into the combined answer
    fn assemble(
        record: Self::Record,
        response: <Self::Request as Request>::Response,
        fact: String,
    ) -> Self::Details;

    /// Router serving the requests the peer sends to this role
    fn peer_router<D, P>(directory: D, publisher: P) -> RequestRouter
    where
        D: SubjectDirectory + Send + Sync + 'static,
        P: NotificationPublisher + Send + Sync + 'static;
}

/// Searches for clients, the wealth is requested and the role arrives as fact
pub struct ClientSaga;

impl LookupSaga for ClientSaga {
    const KIND: SubjectKind = SubjectKind::Client;
    const SERVICE_NAME: &'static str = "Client service";
    const QUEUE: &'static str = "client_details_queue";
    const DEFAULT_PORT: u16 = PORT_CLIENT_SERVICE;
    const DEFAULT_PEER: &'static str = "http://localhost:3002";
    const DEFAULT_ON_TIMEOUT: TimeoutBehaviour = TimeoutBehaviour::Fail;
    const FAILURE_MESSAGE: &'static str = "Error getting client details";

    type Record = ClientRecord;
    type Request = ClientWealthRequest;
    type Fact = ClientFunctionNotification;
    type Details = ClientDetails;

    fn lookup<D: SubjectDirectory>(directory: &D, name: &str) -> Option<ClientRecord> {
        directory.client(name)
    }

    fn name(record: &ClientRecord) -> &str {
        &record.name
    }

    fn request(record: &ClientRecord) -> ClientWealthRequest {
        ClientWealthRequest {
            name: record.name.clone(),
        }
    }

    fn assemble(
        record: ClientRecord,
        response: <ClientWealthRequest as Request>::Response,
        fact: String,
    ) -> ClientDetails {
        ClientDetails {
            name: record.name,
            kind: SubjectKind::Client,
            avere_detinuta: response.avere_detinuta,
            functie_in_companie: fact,
        }
    }

    fn peer_router<D, P>(directory: D, publisher: P) -> RequestRouter
    where
        D: SubjectDirectory + Send + Sync + 'static,
        P: NotificationPublisher + Send + Sync + 'static,
    {
        RequestRouter::default().with_processor(CompanyValuationProcessor::new(directory, publisher))
    }
}

/// Searches for companies, the valuation is requested and the headcount arrives as fact
pub struct CompanySaga;

impl LookupSaga for CompanySaga {
    const KIND: SubjectKind = SubjectKind::Companie;
    const SERVICE_NAME: &'static str = "Company service";
    const QUEUE: &'static str = "company_details_queue";
    const DEFAULT_PORT: u16 = PORT_COMPANY_SERVICE;
    const DEFAULT_PEER: &'static str = "http://localhost:3001";
    const DEFAULT_ON_TIMEOUT: TimeoutBehaviour = TimeoutBehaviour::Fallback;
    const FAILURE_MESSAGE: &'static str = "Error getting company details";

    type Record = CompanyRecord;
    type Request = CompanyValuationRequest;
    type Fact = CompanyHeadcountNotification;
    type Details = CompanyDetails;

    fn lookup<D: SubjectDirectory>(directory: &D, name: &str) -> Option<CompanyRecord> {
        directory.company(name)
    }

    fn name(record: &CompanyRecord) -> &str {
        &record.name
    }

    fn request(record: &CompanyRecord) -> CompanyValuationRequest {
        CompanyValuationRequest {
            name: record.name.clone(),
        }
    }

    fn assemble(
        record: CompanyRecord,
        response: <CompanyValuationRequest as Request>::Response,
        fact: String,
    ) -> CompanyDetails {
        CompanyDetails {
            name: record.name,
            kind: SubjectKind::Companie,
            valoare_estimata: response.valoare_estimata,
            numar_de_angajati: fact,
        }
    }

    fn peer_router<D, P>(directory: D, publisher: P) -> RequestRouter
    where
        D: SubjectDirectory + Send + Sync + 'static,
        P: NotificationPublisher + Send + Sync + 'static,
    {
        RequestRouter::default().with_processor(ClientWealthProcessor::new(directory, publisher))
    }
}

/// Reasons for a search to fail after it has been accepted
#[derive(Debug, Error)]
pub enum SagaError {
    /// The peer could not answer the request
    #[error("peer request failed: {0}")]
    Peer(#[from] RequestError),
    /// The fact could not be awaited
    #[error("awaiting fact failed: {0}")]
    Correlation(#[from] CorrelationError),
}

/// Final state of a search
#[derive(Debug)]
pub enum SagaOutcome<T> {
    /// Both halves have been joined
    Found(T),
    /// The subject is not known locally, nothing has been requested or awaited
    NotFound(SubjectNotFound),
    /// The search has been rejected before doing anything
    Invalid(SearchValidationError),
    /// The search failed while talking to the peer or awaiting the fact
    Failed(SagaError),
}

/// Drives searches from validation to the combined answer
///
/// Every search validates the request, checks the subject against local data, requests one half
/// from the peer, registers interest in the fact the peer publishes as a consequence and joins both.
pub struct SagaCoordinator<S, D, R> {
    directory: D,
    requestor: R,
    registry: CorrelationRegistry<String>,
    request_timeout: Duration,
    fact_timeout: Duration,
    policy: TimeoutPolicy<String>,
    saga: PhantomData<fn() -> S>,
}

impl<S, D, R> SagaCoordinator<S, D, R>
where
    S: LookupSaga,
    D: SubjectDirectory + Send + Sync,
    R: Requestor + Send + Sync,
    <S::Request as Request>::Response: Send + Sync,
{
    /// Creates a new instance from raw parts
    ///
    /// The `registry` has to be the one into which the facts of [`S::Fact`](LookupSaga::Fact) are resolved.
    /// Facts have to arrive within `fact_timeout` after the peer answered, the peer itself gets
    /// [`DEFAULT_REQUEST_TIMEOUT`].
    pub fn new(
        directory: D,
        requestor: R,
        registry: CorrelationRegistry<String>,
        fact_timeout: Duration,
        policy: TimeoutPolicy<String>,
    ) -> Self {
        Self {
            directory,
            requestor,
            registry,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fact_timeout,
            policy,
            saga: PhantomData,
        }
    }

    /// Time the peer gets to answer before the search fails with [`RequestError::TimedOut`]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Runs a search to completion
    #[instrument(skip(self, search), fields(saga = %Uuid::new_v4(), kind = %S::KIND))]
    pub async fn run(&self, search: &SearchRequest) -> SagaOutcome<S::Details> {
        let name = match search.subject(S::KIND) {
            Ok(name) => name,
            Err(error) => {
                info!(%error, "Rejected search");
                return SagaOutcome::Invalid(error);
            }
        };

        let record = match S::lookup(&self.directory, name) {
            Some(record) => record,
            None => {
                info!(subject = name, "Subject not found");
                return SagaOutcome::NotFound(SubjectNotFound::new(S::KIND, name));
            }
        };

        match self.join(record).await {
            Ok(details) => SagaOutcome::Found(details),
            Err(error) => {
                warn!(subject = name, %error, "Search failed");
                SagaOutcome::Failed(error)
            }
        }
    }

    async fn join(&self, record: S::Record) -> Result<S::Details, SagaError> {
        let subject = S::name(&record).to_owned();

        self.registry.ensure_vacant(&subject)?;

        debug!(%subject, "Requesting details from peer");
        let request = S::request(&record);
        let response = timeout(self.request_timeout, self.requestor.request(&request))
            .await
            .map_err(|_| RequestError::TimedOut(self.request_timeout))??;

        debug!(%subject, "Awaiting fact");
        let pending = self
            .registry
            .register(&subject, self.fact_timeout, self.policy.clone())?;
        let resolution = pending.wait().await?;

        if resolution.is_delivered() {
            info!(%subject, "Joined response and fact");
        } else {
            warn!(%subject, "Fact did not arrive in time, using fallback");
        }

        Ok(S::assemble(record, response, resolution.into_value()))
    }
}

#[cfg(test)]
mod does {
    use super::super::FactConsumer;
    use super::*;
    use crate::domain::StaticDirectory;
    use crate::library::communication::broker::BrokerConnection;
    use crate::library::communication::event::{ConsumerExt, Notification, QueueBinding};
    use crate::library::communication::implementation::memory::{LocalRequestor, MemoryExchange};
    use pretty_assertions::assert_eq;
    use tokio::time::sleep;

    struct Deployment {
        exchange: MemoryExchange,
        client_connection: BrokerConnection<MemoryExchange>,
        client_registry: CorrelationRegistry<String>,
        company_registry: CorrelationRegistry<String>,
        /// Requests issued by the client role, served by the company role
        to_company: LocalRequestor,
        /// Requests issued by the company role, served by the client role
        to_client: LocalRequestor,
    }

    fn role<S: LookupSaga>(
        exchange: &MemoryExchange,
    ) -> (BrokerConnection<MemoryExchange>, CorrelationRegistry<String>) {
        let connection = BrokerConnection::new(exchange.clone());
        let registry = CorrelationRegistry::default();

        let supervisor = connection.clone();
        tokio::spawn(async move { supervisor.supervise().await });

        let consumer = FactConsumer::<S::Fact>::new(registry.clone());
        let provider = connection.clone();
        let binding = QueueBinding::new(S::QUEUE, S::Fact::topic().binding());
        tokio::spawn(async move { consumer.consume_queue(&provider, binding).await });

        (connection, registry)
    }

    impl Deployment {
        async fn start(latency: Option<Duration>) -> Self {
            let exchange = MemoryExchange::default();
            let directory = StaticDirectory::seeded();

            let (client_connection, client_registry) = role::<ClientSaga>(&exchange);
            let (company_connection, company_registry) = role::<CompanySaga>(&exchange);

            let mut to_company = LocalRequestor::new(CompanySaga::peer_router(
                directory.clone(),
                company_connection,
            ));
            let mut to_client =
                LocalRequestor::new(ClientSaga::peer_router(directory, client_connection.clone()));

            if let Some(latency) = latency {
                to_company = to_company.with_latency(latency);
                to_client = to_client.with_latency(latency);
            }

            // Let the supervisors connect and the consumers bind
            sleep(Duration::from_millis(10)).await;

            Self {
                exchange,
                client_connection,
                client_registry,
                company_registry,
                to_company,
                to_client,
            }
        }

        fn clients(
            &self,
            policy: TimeoutPolicy<String>,
        ) -> SagaCoordinator<ClientSaga, StaticDirectory, LocalRequestor> {
            SagaCoordinator::new(
                StaticDirectory::seeded(),
                self.to_company.clone(),
                self.client_registry.clone(),
                Duration::from_secs(10),
                policy,
            )
        }

        fn companies(&self) -> SagaCoordinator<CompanySaga, StaticDirectory, LocalRequestor> {
            SagaCoordinator::new(
                StaticDirectory::seeded(),
                self.to_client.clone(),
                self.company_registry.clone(),
                Duration::from_secs(10),
                TimeoutPolicy::Fallback("Unknown".into()),
            )
        }
    }

    #[tokio::test(start_paused = true)]
    async fn join_client_wealth_and_role() {
        let deployment = Deployment::start(None).await;

        let outcome = deployment
            .clients(TimeoutPolicy::Fail)
            .run(&SearchRequest::new(SubjectKind::Client, "Elon Musk"))
            .await;

        match outcome {
            SagaOutcome::Found(details) => assert_eq!(
                details,
                ClientDetails {
                    name: "Elon Musk".into(),
                    kind: SubjectKind::Client,
                    avere_detinuta: "$USD 10,000,000".into(),
                    functie_in_companie: "CEO".into(),
                }
            ),
            other => panic!("unexpected outcome {:?}", other),
        }

        assert_eq!(deployment.to_company.calls(), 1);
        assert_eq!(deployment.client_registry.pending(), 0);

        sleep(Duration::from_millis(10)).await;
        assert_eq!(
            deployment.client_connection.acknowledged(ClientSaga::QUEUE),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn join_company_valuation_and_headcount() {
        let deployment = Deployment::start(None).await;

        let outcome = deployment
            .companies()
            .run(&SearchRequest::new(SubjectKind::Companie, "Tesla"))
            .await;

        match outcome {
            SagaOutcome::Found(details) => {
                assert_eq!(details.valoare_estimata, "$USD 70,000,000");
                assert_eq!(details.numar_de_angajati, "25,000");
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        assert!(deployment.company_registry.statistics().resolved() >= 1);
        assert_eq!(deployment.company_registry.statistics().timed_out(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn short_circuit_unknown_subjects() {
        let deployment = Deployment::start(None).await;

        let client = deployment
            .clients(TimeoutPolicy::Fail)
            .run(&SearchRequest::new(SubjectKind::Client, "Jeff Bezos"))
            .await;
        let company = deployment
            .companies()
            .run(&SearchRequest::new(SubjectKind::Companie, "SpaceX"))
            .await;

        match (client, company) {
            (SagaOutcome::NotFound(client), SagaOutcome::NotFound(company)) => {
                assert!(!client.found);
                assert_eq!(client.details, "Client 'Jeff Bezos' not found.");
                assert_eq!(company.details, "Company 'SpaceX' not found.");
            }
            other => panic!("unexpected outcomes {:?}", other),
        }

        assert_eq!(deployment.to_company.calls(), 0);
        assert_eq!(deployment.to_client.calls(), 0);
        assert!(deployment.exchange.published().is_empty());
        assert_eq!(deployment.client_registry.statistics().registered(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pick_up_facts_that_overtake_the_response() {
        let deployment = Deployment::start(Some(Duration::from_millis(500))).await;

        let outcome = deployment
            .clients(TimeoutPolicy::Fail)
            .run(&SearchRequest::new(SubjectKind::Client, "Elon Musk"))
            .await;

        match outcome {
            SagaOutcome::Found(details) => assert_eq!(details.functie_in_companie, "CEO"),
            other => panic!("unexpected outcome {:?}", other),
        }

        let statistics = deployment.client_registry.statistics();
        assert_eq!(statistics.buffered(), 1);
        assert_eq!(statistics.timed_out(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reject_invalid_searches_without_side_effects() {
        let deployment = Deployment::start(None).await;

        let outcome = deployment
            .clients(TimeoutPolicy::Fail)
            .run(&SearchRequest::new(SubjectKind::Companie, "Tesla"))
            .await;

        assert!(matches!(
            outcome,
            SagaOutcome::Invalid(SearchValidationError::WrongKind { .. })
        ));
        assert_eq!(deployment.to_company.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fail_when_the_peer_is_unreachable() {
        let deployment = Deployment::start(None).await;
        deployment.to_company.set_reachable(false);

        let outcome = deployment
            .clients(TimeoutPolicy::Fail)
            .run(&SearchRequest::new(SubjectKind::Client, "Elon Musk"))
            .await;

        assert!(matches!(
            outcome,
            SagaOutcome::Failed(SagaError::Peer(RequestError::Unreachable(_)))
        ));
        assert_eq!(deployment.client_registry.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn give_up_on_peers_that_never_answer() {
        let deployment = Deployment::start(Some(Duration::from_secs(60))).await;

        let started = tokio::time::Instant::now();
        let outcome = deployment
            .clients(TimeoutPolicy::Fail)
            .with_request_timeout(Duration::from_secs(2))
            .run(&SearchRequest::new(SubjectKind::Client, "Elon Musk"))
            .await;

        assert!(matches!(
            outcome,
            SagaOutcome::Failed(SagaError::Peer(RequestError::TimedOut(t))) if t == Duration::from_secs(2)
        ));
        assert!(started.elapsed() < Duration::from_secs(60));
        assert_eq!(deployment.client_registry.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn refuse_concurrent_searches_before_asking_the_peer() {
        let deployment = Deployment::start(None).await;
        let _earlier = deployment
            .client_registry
            .register("Elon Musk", Duration::from_secs(10), TimeoutPolicy::Fail)
            .unwrap();

        let outcome = deployment
            .clients(TimeoutPolicy::Fail)
            .run(&SearchRequest::new(SubjectKind::Client, "elon musk"))
            .await;

        assert!(matches!(
            outcome,
            SagaOutcome::Failed(SagaError::Correlation(CorrelationError::AlreadyPending { .. }))
        ));
        assert_eq!(deployment.to_company.calls(), 0);
        assert!(deployment.exchange.published().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn apply_the_timeout_policy_when_no_fact_arrives() {
        let deployment = Deployment::start(None).await;
        deployment.exchange.set_available(false);
        deployment.exchange.disconnect();
        sleep(Duration::from_millis(10)).await;

        let failing = deployment
            .clients(TimeoutPolicy::Fail)
            .run(&SearchRequest::new(SubjectKind::Client, "Elon Musk"))
            .await;
        assert!(matches!(
            failing,
            SagaOutcome::Failed(SagaError::Correlation(CorrelationError::TimedOut { .. }))
        ));

        let falling_back = deployment
            .clients(TimeoutPolicy::Fallback("Unknown".into()))
            .run(&SearchRequest::new(SubjectKind::Client, "Elon Musk"))
            .await;
        match falling_back {
            SagaOutcome::Found(details) => {
                assert_eq!(details.avere_detinuta, "$USD 10,000,000");
                assert_eq!(details.functie_in_companie, "Unknown");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
