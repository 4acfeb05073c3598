use std::sync::Arc;

use anyhow::Context;
use csl_tunnel_core::prelude::ResultTable;
use csl_tunnel_instruments::ReportAssembler;

use crate::context::RunnerContext;
use crate::definition::{SweepDefinitionBuilder, SweepMode};
use crate::executor::Executor;
use crate::progress::start_progress;
use crate::shutdown::start_shutdown_listener;
use crate::sweep::SweepOrchestrator;
use crate::types::TunnelResult;

/// Run a sweep to completion and print its report.
///
/// Returns the result table, or the first failure. A failure at any point means no report is
/// printed or written.
pub fn run(definition: SweepDefinitionBuilder) -> TunnelResult<ResultTable> {
    let definition = definition.build()?;

    log::info!("Running sweep: {}", definition.name);

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let shutdown_handle = start_shutdown_listener(&runtime)?;
    let executor = Arc::new(Executor::new(runtime, shutdown_handle.clone()));
    let runner_context = RunnerContext::new(
        executor,
        shutdown_handle.clone(),
        definition.simulator_path.clone(),
        definition.speed.clone(),
    );

    let engine = (definition.engine_factory)(&runner_context)
        .context("Failed to start the simulation engine")?;

    let radio_model = definition.config.radio_model;
    let mut orchestrator = SweepOrchestrator::new(engine, definition.config)?
        .with_shutdown_listener(shutdown_handle.new_listener());

    let table = match definition.mode {
        SweepMode::Full => {
            if !definition.no_progress {
                let total_runs = orchestrator.total_runs();
                orchestrator = orchestrator.with_progress(start_progress(total_runs));
            }
            orchestrator.run()?
        }
        SweepMode::SinglePoint { parameter, mode } => {
            log::info!("Measuring single point {parameter} in {mode:?} mode");
            if !definition.no_progress {
                orchestrator = orchestrator.with_progress(start_progress(2));
            }
            orchestrator.run_points(&[(parameter, mode)])?
        }
    };

    // Shut the engine down before reporting so that simulator output does not interleave.
    drop(orchestrator);

    let assembler = ReportAssembler::new(&table);
    assembler.print(&definition.name);
    if let Some(path) = &definition.json_out {
        assembler.write_json(path, &definition.name, radio_model.as_str())?;
    }

    Ok(table)
}
