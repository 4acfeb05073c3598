use std::path::PathBuf;
use std::sync::Arc;

use csl_tunnel_core::prelude::ShutdownHandle;

use crate::executor::Executor;

/// What an engine factory gets to work with when the runner asks it for a simulation engine.
#[derive(Debug)]
pub struct RunnerContext {
    executor: Arc<Executor>,
    shutdown_handle: ShutdownHandle,
    simulator_path: Option<PathBuf>,
    speed: String,
}

impl RunnerContext {
    pub(crate) fn new(
        executor: Arc<Executor>,
        shutdown_handle: ShutdownHandle,
        simulator_path: Option<PathBuf>,
        speed: String,
    ) -> Self {
        Self {
            executor,
            shutdown_handle,
            simulator_path,
            speed,
        }
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    pub fn shutdown_handle(&self) -> &ShutdownHandle {
        &self.shutdown_handle
    }

    /// The simulator binary chosen on the command line, if any.
    pub fn simulator_path(&self) -> Option<&PathBuf> {
        self.simulator_path.as_ref()
    }

    /// Simulation speed as given on the command line.
    pub fn speed(&self) -> &str {
        &self.speed
    }

    /// Ask the sweep to stop, as if the user had pressed Ctrl-C.
    pub fn force_stop_sweep(&self) {
        self.shutdown_handle.shutdown();
    }
}
