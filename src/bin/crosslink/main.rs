use anyhow::Result;
use crosslink::harness::ModuleRunner;
use crosslink::module::auth::Auth;
use crosslink::module::gateway::Gateway;
use crosslink::module::service::{ClientService, CompanyService};
use options::{Command, LogFormat};
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod options;

#[tokio::main]
async fn main() -> Result<()> {
    let (command, runner) = init()?;

    let reason = match command {
        Command::ClientService(options) => runner.run(ClientService::new(options)).await,
        Command::CompanyService(options) => runner.run(CompanyService::new(options)).await,
        Command::Gateway(options) => runner.run(Gateway::new(options)).await,
        Command::Auth(options) => runner.run(Auth::new(options)).await,
    };

    if reason.is_clean() {
        Ok(())
    } else {
        Err(reason.into())
    }
}

fn init() -> Result<(Command, ModuleRunner)> {
    let options = options::MainOptions::from_args();

    let formatter = tracing_subscriber::fmt().with_env_filter(EnvFilter::try_new(&options.log)?);

    match options.log_format {
        LogFormat::Text => formatter.try_init(),
        LogFormat::Compact => formatter.compact().try_init(),
        LogFormat::Json => formatter.json().try_init(),
    }
    .map_err(|e| anyhow::anyhow!(e))?;

    info!("crosslink {}", env!("CARGO_PKG_VERSION"));

    let runner = ModuleRunner::new(options.status_server).with_grace_period(options.grace_period);

    Ok((options.command, runner))
}
