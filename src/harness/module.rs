use super::{DeathReason, Heart};
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use futures::lock::Mutex;
use jatsl::{JobScheduler, State, StatusServer};
use std::any::type_name;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// Executable module
///
/// The lifecycle is `pre_startup`, `run`, waiting for the returned [`Heart`] (if any) and `post_shutdown`.
/// Jobs spawned onto the scheduler in `run` are terminated before `post_shutdown` is called.
#[async_trait]
pub trait Module {
    /// Executed before running the core loop
    async fn pre_startup(&mut self) -> EmptyResult {
        Ok(())
    }

    /// Spawns the jobs of the module
    ///
    /// Returning `Some(heart)` keeps the jobs alive until the heart dies, returning `None` shuts down right away.
    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError>;

    /// Shutdown hook executed after all jobs have terminated
    async fn post_shutdown(&mut self, _termination_reason: &ModuleTerminationReason) {}
}

/// Reason why a module has terminated
#[derive(Error, Debug)]
pub enum ModuleTerminationReason {
    /// Startup routine threw an error
    #[error("startup routine threw an error")]
    StartupFailed(#[source] BoxedError),
    /// Core run loop threw an error
    #[error("error during operation")]
    OperationalError(#[source] BoxedError),
    /// [`Heart`] provided by module died
    #[error("heart provided by module died: {0}")]
    HeartDied(DeathReason),
    /// Run loop exited cleanly
    #[error("run loop exited cleanly")]
    ExitedNormally,
    /// Startup did not finish in time
    #[error("startup did not finish within {0:?}")]
    Timeout(Duration),
}

impl ModuleTerminationReason {
    /// Whether the module went down the way it is supposed to, either on its own or by external signal
    pub fn is_clean(&self) -> bool {
        matches!(
            self,
            ModuleTerminationReason::ExitedNormally
                | ModuleTerminationReason::HeartDied(DeathReason::Terminated)
        )
    }
}

type StatusHandle = Option<Arc<Mutex<State>>>;

/// Drives a [`Module`] through its lifecycle on a fresh [`JobScheduler`]
pub struct ModuleRunner {
    startup_timeout: Duration,
    shutdown_timeout: Duration,
    grace_period: Duration,
    status_server_port: Option<u16>,
}

impl Default for ModuleRunner {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(60),
            shutdown_timeout: Duration::from_secs(60),
            grace_period: Duration::from_secs(5),
            status_server_port: None,
        }
    }
}

impl ModuleRunner {
    /// Creates a new instance with default timeouts, optionally exposing a readiness probe on the given port
    pub fn new(status_server_port: Option<u16>) -> Self {
        Self {
            status_server_port,
            ..Default::default()
        }
    }

    /// Time granted to jobs supporting graceful termination before they are aborted
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Upper bound for the `pre_startup` hook
    pub fn with_startup_timeout(mut self, startup_timeout: Duration) -> Self {
        self.startup_timeout = startup_timeout;
        self
    }

    /// Runs the module until it exits and reports why it did
    #[instrument(skip(self, module), fields(module_name = type_name::<M>()))]
    pub async fn run<M: Module + Send + Sync>(&self, mut module: M) -> ModuleTerminationReason {
        let scheduler = JobScheduler::default();
        let status = self.spawn_status_server(&scheduler).await;

        let reason = match self.start(&mut module).await {
            Ok(()) => Self::operate(&mut module, &scheduler, &status).await,
            Err(reason) => reason,
        };

        Self::set_status(&status, State::Shutdown).await;

        debug!(grace_period = ?self.grace_period, "Terminating jobs");
        scheduler.terminate_jobs(self.grace_period).await;

        if timeout(self.shutdown_timeout, module.post_shutdown(&reason))
            .await
            .is_err()
        {
            warn!(timeout = ?self.shutdown_timeout, "Shutdown hook did not finish in time");
        }

        if reason.is_clean() {
            info!(%reason, "Module stopped");
        } else {
            error!(%reason, "Module stopped abnormally");
        }

        reason
    }

    async fn spawn_status_server(&self, scheduler: &JobScheduler) -> StatusHandle {
        let port = self.status_server_port?;

        info!(port, "Spawning status server");
        let (state, server) = StatusServer::new(scheduler, port);
        scheduler.spawn_job(server).await;

        Some(state)
    }

    async fn set_status(status: &StatusHandle, state: State) {
        if let Some(status) = status {
            *status.lock().await = state;
        }
    }

    async fn start<M: Module + Send + Sync>(
        &self,
        module: &mut M,
    ) -> Result<(), ModuleTerminationReason> {
        debug!("Running startup hook");

        match timeout(self.startup_timeout, module.pre_startup()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(ModuleTerminationReason::StartupFailed(error)),
            Err(_) => Err(ModuleTerminationReason::Timeout(self.startup_timeout)),
        }
    }

    async fn operate<M: Module + Send + Sync>(
        module: &mut M,
        scheduler: &JobScheduler,
        status: &StatusHandle,
    ) -> ModuleTerminationReason {
        let heart = match module.run(scheduler).await {
            Ok(heart) => heart,
            Err(error) => return ModuleTerminationReason::OperationalError(error),
        };

        Self::set_status(status, State::Running).await;

        match heart {
            Some(mut heart) => {
                info!("Module is up");
                ModuleTerminationReason::HeartDied(heart.death().await)
            }
            None => ModuleTerminationReason::ExitedNormally,
        }
    }
}
