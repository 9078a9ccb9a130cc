use crate::library::communication::event::{ConsumerExt, QueueBinding, QueueProvider};
use crate::library::EmptyResult;
use async_trait::async_trait;
use jatsl::{Job, JobManager};
use tokio::select;

/// Job which feeds a bound queue into a [`Consumer`](crate::library::communication::event::Consumer)
pub struct QueueConsumerJob<C, Q> {
    consumer: C,
    provider: Q,
    binding: QueueBinding,
}

impl<C, Q> QueueConsumerJob<C, Q> {
    /// Creates a new job which binds a queue through the provider and hands every entry to the consumer
    pub fn new(consumer: C, provider: Q, binding: QueueBinding) -> Self {
        Self {
            consumer,
            provider,
            binding,
        }
    }
}

#[async_trait]
impl<C, Q> Job for QueueConsumerJob<C, Q>
where
    C: ConsumerExt + Send + Sync,
    Q: QueueProvider + Send + Sync,
{
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    fn name(&self) -> String {
        format!("{}({})", Self::NAME, self.binding.queue())
    }

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        manager.ready().await;

        select! {
            result = self.consumer.consume_queue(&self.provider, self.binding.clone()) => result?,
            _ = manager.termination_signal() => {},
        }

        Ok(())
    }
}
