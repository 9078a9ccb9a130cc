//! HTTP front door which authenticates searches and routes them by subject kind

use crate::constants::PORT_GATEWAY;
use crate::domain::token::TokenAuthority;
use crate::harness::{Heart, Module};
use crate::library::http::HealthResponder;
use crate::library::{BoxedError, EmptyResult};
use crate::make_responder_chain_service_fn;
use async_trait::async_trait;
use hyper::Server;
use jatsl::{schedule, Job, JobManager, JobScheduler};
use std::net::SocketAddr;
use tracing::info;

mod options;
mod search;

pub use options::{Options, Upstreams};
pub use search::SearchForwardingResponder;

const GREETING: &str = "API Gateway funcționează (simplified auth)";

/// HTTP listener of the gateway
pub struct GatewayJob {
    port: u16,
    authority: TokenAuthority,
    upstreams: Upstreams,
}

impl GatewayJob {
    /// Creates a new instance from raw parts
    pub fn new(port: u16, authority: TokenAuthority, upstreams: Upstreams) -> Self {
        Self {
            port,
            authority,
            upstreams,
        }
    }
}

#[async_trait]
impl Job for GatewayJob {
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let health = HealthResponder::new(GREETING, "API Gateway is healthy");
        let search =
            SearchForwardingResponder::new(self.authority.clone(), self.upstreams.clone());

        let make_svc = make_responder_chain_service_fn! {
            health,
            search
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let server = Server::try_bind(&addr)?.serve(make_svc);
        let graceful = server.with_graceful_shutdown(manager.termination_signal());

        info!(port = self.port, "Gateway listening");
        manager.ready().await;
        graceful.await?;

        Ok(())
    }
}

/// Module implementation
pub struct Gateway {
    options: Options,
}

impl Gateway {
    /// Creates a new instance from raw parts
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Module for Gateway {
    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        let authority = TokenAuthority::new(&self.options.token.secret, self.options.token.lifetime);
        let port = self.options.http.port.unwrap_or(PORT_GATEWAY);

        info!(
            client_service = %self.options.upstreams.client_service,
            company_service = %self.options.upstreams.company_service,
            "Routing searches"
        );

        let gateway_job = GatewayJob::new(port, authority, self.options.upstreams.clone());

        schedule!(scheduler, { gateway_job });

        Ok(Some(Heart::without_heart_stone()))
    }
}
