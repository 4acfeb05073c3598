use std::future::Future;
use std::time::Duration;

use csl_tunnel_core::prelude::{ShutdownHandle, ShutdownSignalError};

/// Returned by [Executor::execute_with_deadline] when the simulator did not answer in time.
#[derive(derive_more::Error, derive_more::Display, Debug, Clone, PartialEq, Eq)]
#[display("No answer to `{operation}` within {limit:?}")]
pub struct DeadlineError {
    pub operation: String,
    pub limit: Duration,
}

/// Owns the async runtime that engine bindings do their I/O on. The sweep itself is synchronous,
/// so every engine call blocks here until the simulator has answered, the user interrupts the
/// sweep, or a deadline passes.
#[derive(Debug)]
pub struct Executor {
    runtime: tokio::runtime::Runtime,
    shutdown_handle: ShutdownHandle,
}

impl Executor {
    pub(crate) fn new(runtime: tokio::runtime::Runtime, shutdown_handle: ShutdownHandle) -> Self {
        Self {
            runtime,
            shutdown_handle,
        }
    }

    /// Block on `fut`. A shutdown request drops the future and returns [ShutdownSignalError].
    ///
    /// Must not be called from within async code.
    pub fn execute_in_place<T>(
        &self,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        if self.shutdown_handle.new_listener().should_shutdown() {
            return Err(ShutdownSignalError::default().into());
        }

        let mut shutdown_listener = self.shutdown_handle.new_listener();
        self.runtime.block_on(async move {
            tokio::select! {
                biased;
                _ = shutdown_listener.wait_for_shutdown() => {
                    Err(anyhow::anyhow!(ShutdownSignalError::default()))
                },
                result = fut => result,
            }
        })
    }

    /// [Executor::execute_in_place] with a wall-clock limit. `operation` names what was being
    /// waited for in the [DeadlineError].
    pub fn execute_with_deadline<T>(
        &self,
        limit: Duration,
        operation: &str,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        self.execute_in_place(async move {
            match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => Err(DeadlineError {
                    operation: operation.to_string(),
                    limit,
                }
                .into()),
            }
        })
    }

    /// Run `fut` in the background, such as draining a child process's output. It is neither
    /// cancelled on shutdown nor waited for.
    pub fn spawn(&self, fut: impl Future<Output = ()> + Send + 'static) {
        self.runtime.spawn(fut);
    }
}
