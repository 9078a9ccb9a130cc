use crate::domain::event::DetailFact;
use crate::library::communication::correlation::CorrelationRegistry;
use crate::library::communication::event::Consumer;
use crate::library::EmptyResult;
use async_trait::async_trait;
use std::marker::PhantomData;
use tracing::{debug, trace};

/// Hands every consumed [`DetailFact`] to the [`CorrelationRegistry`] of the awaiting searches
pub struct FactConsumer<F> {
    registry: CorrelationRegistry<String>,
    fact: PhantomData<fn() -> F>,
}

impl<F> FactConsumer<F> {
    /// Creates a new instance resolving correlations in the given registry
    pub fn new(registry: CorrelationRegistry<String>) -> Self {
        Self {
            registry,
            fact: PhantomData,
        }
    }
}

#[async_trait]
impl<F> Consumer for FactConsumer<F>
where
    F: DetailFact + Send + Sync + 'static,
{
    type Notification = F;

    async fn consume(&self, fact: F) -> EmptyResult {
        let subject = fact.subject().to_owned();

        if self.registry.resolve(&subject, fact.into_value()) {
            debug!(%subject, "Fact completed a pending search");
        } else {
            trace!(%subject, "Fact did not match a pending search");
        }

        Ok(())
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::domain::event::CompanyHeadcountNotification;
    use crate::library::communication::broker::BrokerConnection;
    use crate::library::communication::correlation::TimeoutPolicy;
    use crate::library::communication::event::{ConsumerExt, Notification, QueueBinding};
    use crate::library::communication::implementation::memory::MemoryExchange;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn resolve_matching_facts_and_survive_garbage() {
        let exchange = MemoryExchange::default();
        let connection = BrokerConnection::new(exchange.clone());
        let registry = CorrelationRegistry::<String>::default();

        let supervisor = connection.clone();
        tokio::spawn(async move { supervisor.supervise().await });

        let consumer = FactConsumer::<CompanyHeadcountNotification>::new(registry.clone());
        let provider = connection.clone();
        let binding = QueueBinding::new(
            "company_details_queue",
            CompanyHeadcountNotification::topic().binding(),
        );
        tokio::spawn(async move { consumer.consume_queue(&provider, binding).await });
        sleep(Duration::from_millis(10)).await;

        let pending = registry
            .register("TESLA", Duration::from_secs(10), TimeoutPolicy::Fail)
            .unwrap();

        exchange.inject("company.details.tesla", b"{ not json");
        exchange.inject(
            "company.details.tesla",
            br#"{"name":"Tesla","numar_de_angajati":"25,000","founded":2003}"#,
        );

        assert_eq!(pending.wait().await.unwrap().into_value(), "25,000");

        sleep(Duration::from_millis(10)).await;
        assert_eq!(connection.acknowledged("company_details_queue"), 2);
    }
}
