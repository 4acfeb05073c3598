mod cli;
mod context;
mod definition;
mod engine;
mod executor;
mod init;
mod lease;
mod progress;
mod run;
mod scenario;
mod shutdown;
mod stats;
mod sweep;
mod types;

pub mod prelude {
    pub use crate::cli::SweepCli;
    pub use crate::context::RunnerContext;
    pub use crate::definition::{EngineFactory, SweepDefinitionBuilder, SweepMode, DEFAULT_SPEED};
    pub use crate::engine::{
        NodeId, NodeKind, Partition, RadioModel, SimulationEngine, TopologyError,
    };
    pub use crate::executor::{DeadlineError, Executor};
    pub use crate::lease::NodeLease;
    pub use crate::run::run;
    pub use crate::scenario::{
        commands, ListeningMode, ScenarioConfig, ScenarioOutcome, ScenarioRunner,
    };
    pub use crate::stats::{extract_stats, StatsError, ACTIVE_TIME_LABEL, SLEEP_TIME_LABEL};
    pub use crate::sweep::{SweepConfig, SweepOrchestrator, DEFAULT_DOMAIN};
    pub use crate::types::TunnelResult;

    pub use csl_tunnel_core::prelude::*;
}
