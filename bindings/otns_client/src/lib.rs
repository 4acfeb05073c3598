//! Drives the OpenThread network simulator (OTNS) as a [`SimulationEngine`].

mod client;
mod config;
mod response;

pub use client::OtnsClient;
pub use config::{OtnsConfig, OtnsConfigBuilder, DEFAULT_READ_TIMEOUT, OTNS_PATH_ENV};
pub use response::OtnsCliError;

use csl_tunnel_runner::prelude::{RunnerContext, SimulationEngine, TunnelResult};

/// Engine factory for [`csl_tunnel_runner::prelude::SweepDefinitionBuilder::use_engine`].
///
/// Uses the simulator binary from the command line if one was given, otherwise the one named by
/// [`OTNS_PATH_ENV`] or found on `PATH`.
pub fn otns_engine(ctx: &RunnerContext) -> TunnelResult<Box<dyn SimulationEngine>> {
    let mut builder = OtnsConfigBuilder::default().with_speed(ctx.speed());
    if let Some(path) = ctx.simulator_path() {
        builder = builder.with_bin_path(path);
    }

    let config = builder.build()?;
    let client = OtnsClient::start(ctx.executor().clone(), &config)?;

    Ok(Box::new(client))
}
