use std::future::Future;

use tokio::{runtime::Runtime, sync::broadcast, task::JoinHandle};

/// Tokio runtime wrapper that hands every spawned task a shutdown receiver,
/// so long-running loops can unwind cooperatively instead of being dropped
/// mid-write.
pub struct TaskExecutor {
    runtime: Runtime,
    shutdown: broadcast::Sender<()>,
}

impl TaskExecutor {
    pub fn new() -> std::io::Result<Self> {
        let runtime = Runtime::new()?;
        let (shutdown, _) = broadcast::channel(1);
        Ok(Self { runtime, shutdown })
    }

    /// Spawns a task that receives the executor's shutdown channel. The task
    /// decides where in its loop to observe the signal.
    pub fn spawn_cancellable<F, Fut, T>(&self, future_fn: F) -> JoinHandle<T>
    where
        F: FnOnce(broadcast::Receiver<()>) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let shutdown = self.shutdown.subscribe();
        self.runtime.spawn(async move { future_fn(shutdown).await })
    }

    /// Spawns a task that is abandoned outright once shutdown is signalled.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<Option<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let mut shutdown = self.shutdown.subscribe();
        self.runtime.spawn(async move {
            tokio::select! {
                result = future => Some(result),
                _ = shutdown.recv() => None,
            }
        })
    }

    /// Triggers the shutdown signal to all spawned tasks.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    /// Get a reference to the underlying runtime
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;

    #[test]
    fn test_basic_task() {
        let executor = TaskExecutor::new().unwrap();

        let handle = executor.spawn(async {
            sleep(Duration::from_millis(100)).await;
            42
        });

        assert_eq!(executor.runtime.block_on(handle).unwrap(), Some(42));
    }

    #[test]
    fn test_cancellable_task() {
        let executor = TaskExecutor::new().unwrap();

        let handle = executor.spawn_cancellable(|mut shutdown| async move {
            tokio::select! {
                _ = sleep(Duration::from_secs(1)) => "completed",
                _ = shutdown.recv() => "cancelled",
            }
        });

        executor.shutdown();
        assert_eq!(executor.runtime.block_on(handle).unwrap(), "cancelled");
    }

    #[test]
    fn test_abandoned_on_shutdown() {
        let executor = TaskExecutor::new().unwrap();

        let handle = executor.spawn(async {
            sleep(Duration::from_secs(1)).await;
            42
        });

        executor.shutdown();
        assert_eq!(executor.runtime.block_on(handle).unwrap(), None);
    }
}
