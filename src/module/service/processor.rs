use crate::domain::event::{ClientFunctionNotification, CompanyHeadcountNotification};
use crate::domain::request::{
    ClientWealthRequest, ClientWealthResponse, CompanyValuationRequest, CompanyValuationResponse,
};
use crate::domain::SubjectDirectory;
use crate::library::communication::event::{Notification, NotificationPublisher};
use crate::library::communication::request::OptionalRequestProcessor;
use crate::library::BoxedError;
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

/// Publishes a fact, failures are logged and never reach the caller
async fn publish_fact<P, N>(publisher: &P, fact: &N)
where
    P: NotificationPublisher + Send + Sync,
    N: Notification + Send + Sync,
{
    match publisher.publish(fact).await {
        Ok(()) => debug!(routing_key = %fact.routing_key(), "Published fact"),
        Err(error) => warn!(routing_key = %fact.routing_key(), %error, "Failed to publish fact"),
    }
}

/// Answers [`CompanyValuationRequest`]s and publishes the headcount of the company
pub struct CompanyValuationProcessor<D, P> {
    directory: D,
    publisher: P,
}

impl<D, P> CompanyValuationProcessor<D, P> {
    /// Creates a new instance from raw parts
    pub fn new(directory: D, publisher: P) -> Self {
        Self {
            directory,
            publisher,
        }
    }
}

#[async_trait]
impl<D, P> OptionalRequestProcessor for CompanyValuationProcessor<D, P>
where
    D: SubjectDirectory + Send + Sync,
    P: NotificationPublisher + Send + Sync,
{
    type Request = CompanyValuationRequest;

    #[instrument(skip(self, request), fields(subject = %request.name))]
    async fn maybe_process(
        &self,
        request: CompanyValuationRequest,
    ) -> Result<Option<CompanyValuationResponse>, BoxedError> {
        let company = match self.directory.company(&request.name) {
            Some(company) => company,
            None => {
                debug!("Declining valuation of unknown company");
                return Ok(None);
            }
        };

        let fact = CompanyHeadcountNotification {
            name: company.name,
            numar_de_angajati: company.numar_de_angajati,
        };

        publish_fact(&self.publisher, &fact).await;

        Ok(Some(CompanyValuationResponse {
            valoare_estimata: company.valoare_estimata,
        }))
    }
}

/// Answers [`ClientWealthRequest`]s and publishes the role of the client
pub struct ClientWealthProcessor<D, P> {
    directory: D,
    publisher: P,
}

impl<D, P> ClientWealthProcessor<D, P> {
    /// Creates a new instance from raw parts
    pub fn new(directory: D, publisher: P) -> Self {
        Self {
            directory,
            publisher,
        }
    }
}

#[async_trait]
impl<D, P> OptionalRequestProcessor for ClientWealthProcessor<D, P>
where
    D: SubjectDirectory + Send + Sync,
    P: NotificationPublisher + Send + Sync,
{
    type Request = ClientWealthRequest;

    #[instrument(skip(self, request), fields(subject = %request.name))]
    async fn maybe_process(
        &self,
        request: ClientWealthRequest,
    ) -> Result<Option<ClientWealthResponse>, BoxedError> {
        let client = match self.directory.client(&request.name) {
            Some(client) => client,
            None => {
                debug!("Declining wealth of unknown client");
                return Ok(None);
            }
        };

        let fact = ClientFunctionNotification {
            name: client.name,
            functie_in_companie: client.functie_in_companie,
        };

        publish_fact(&self.publisher, &fact).await;

        Ok(Some(ClientWealthResponse {
            avere_detinuta: client.avere_detinuta,
        }))
    }
}
