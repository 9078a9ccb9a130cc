use crate::module::options::{HttpOptions, TokenOptions};
use structopt::StructOpt;

/// Options for the gateway module
#[derive(Debug, StructOpt)]
pub struct Options {
    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub http: HttpOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub token: TokenOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub upstreams: Upstreams,
}

/// Base URLs of the services searches are forwarded to
#[derive(Debug, Clone, StructOpt)]
pub struct Upstreams {
    /// Base URL of the service answering client searches
    #[structopt(long, env, default_value = "http://localhost:3001", value_name = "url")]
    pub client_service: String,

    /// Base URL of the service answering company searches
    #[structopt(long, env, default_value = "http://localhost:3002", value_name = "url")]
    pub company_service: String,
}
