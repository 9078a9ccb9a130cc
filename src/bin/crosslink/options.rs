use crosslink::library::helpers::parse_seconds;
use std::str::FromStr;
use std::time::Duration;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    about = "Search gateway joining synchronous and asynchronous service replies.",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct MainOptions {
    /// Log level, scopable to different modules
    ///
    /// Levels: trace, debug, info, warn, error
    #[structopt(
        short,
        long,
        global = true,
        default_value = "info,hyper=warn,redis=warn",
        env = "RUST_LOG",
        value_name = "level"
    )]
    pub log: String,

    /// Output format of log messages: text, compact or json
    #[structopt(long, global = true, env, default_value = "text", value_name = "format")]
    pub log_format: LogFormat,

    /// Enable status reporting server which can be used as a readiness probe
    #[structopt(long, global = true, env, value_name = "port")]
    pub status_server: Option<u16>,

    /// Seconds granted to running jobs to finish their work on shutdown
    #[structopt(long, global = true, env, default_value = "5", parse(try_from_str = parse_seconds), value_name = "seconds")]
    pub grace_period: Duration,

    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Answers client searches and company valuation requests
    ClientService(crosslink::module::service::Options),
    /// Answers company searches and client wealth requests
    CompanyService(crosslink::module::service::Options),
    /// Authenticates searches and routes them to the services
    Gateway(crosslink::module::gateway::Options),
    /// Registers users and issues access tokens
    Auth(crosslink::module::auth::Options),
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Text,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}
