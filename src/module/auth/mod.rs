//! Registration and login of users, issues the tokens the gateway expects

use crate::constants::PORT_AUTH;
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
mod responder;
mod store;

pub use options::Options;
pub use responder::{AccountResponder, LoginResponse};
pub use store::{CredentialError, CredentialStore};

/// HTTP listener of the auth module
pub struct AuthJob {
    port: u16,
    store: CredentialStore,
    authority: TokenAuthority,
}

impl AuthJob {
    /// Creates a new instance from raw parts
    pub fn new(port: u16, store: CredentialStore, authority: TokenAuthority) -> Self {
        Self {
            port,
            store,
            authority,
        }
    }
}

#[async_trait]
impl Job for AuthJob {
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let health = HealthResponder::new("Auth service is running", "Auth service is healthy");
        let accounts = AccountResponder::new(self.store.clone(), self.authority.clone());

        let make_svc = make_responder_chain_service_fn! {
            health,
            accounts
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let server = Server::try_bind(&addr)?.serve(make_svc);
        let graceful = server.with_graceful_shutdown(manager.termination_signal());

        info!(port = self.port, "Auth service listening");
        manager.ready().await;
        graceful.await?;

        Ok(())
    }
}

/// Module implementation
pub struct Auth {
    options: Options,
}

impl Auth {
    /// Creates a new instance from raw parts
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Module for Auth {
    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        let authority = TokenAuthority::new(&self.options.token.secret, self.options.token.lifetime);
        let port = self.options.http.port.unwrap_or(PORT_AUTH);

        // Users live as long as the module, a restart forgets all of them
        let auth_job = AuthJob::new(port, CredentialStore::default(), authority);

        schedule!(scheduler, { auth_job });

        Ok(Some(Heart::without_heart_stone()))
    }
}
