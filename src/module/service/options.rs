use crate::module::options::{BrokerOptions, CorrelationOptions, HttpOptions};
use crate::library::helpers::parse_seconds;
use std::time::Duration;
use structopt::StructOpt;

/// Options for the service modules
#[derive(Debug, StructOpt)]
pub struct Options {
    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub broker: BrokerOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub correlation: CorrelationOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub http: HttpOptions,

    /// Seconds to wait for the peer to answer a request
    #[structopt(long, env, default_value = "5", parse(try_from_str = parse_seconds), value_name = "seconds")]
    pub rpc_timeout: Duration,

    /// Base URL of the peer service to request details from.
    /// Defaults to the well-known local address of the peer.
    #[structopt(long, env, value_name = "url")]
    pub peer: Option<String>,
}
