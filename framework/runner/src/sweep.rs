use anyhow::Context;
use csl_tunnel_core::prelude::{
    ResultRow, ResultTable, ShutdownListener, ShutdownSignalError, StatsSample, SweepParameter,
};
use indicatif::ProgressBar;
use itertools::Itertools;

use crate::engine::{RadioModel, SimulationEngine};
use crate::scenario::{ListeningMode, ScenarioConfig, ScenarioRunner};
use crate::types::TunnelResult;

/// The sweep domain used when none is configured.
pub const DEFAULT_DOMAIN: [u8; 6] = [1, 10, 20, 50, 100, 255];

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// Values used for both accuracy and uncertainty, in the order they are swept.
    pub domain: Vec<u8>,
    pub radio_model: RadioModel,
    pub scenario: ScenarioConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_vec(),
            radio_model: RadioModel::default(),
            scenario: ScenarioConfig::default(),
        }
    }
}

/// Runs the ideal baseline and then every accuracy/uncertainty pair of the domain, strictly one
/// scenario at a time, against a single engine.
pub struct SweepOrchestrator<E: SimulationEngine> {
    engine: E,
    domain: Vec<u8>,
    runner: ScenarioRunner,
    shutdown_listener: Option<ShutdownListener>,
    progress: Option<ProgressBar>,
}

impl<E: SimulationEngine> SweepOrchestrator<E> {
    /// Take ownership of the engine and apply the radio model to it. This is the only place the
    /// radio model is set.
    pub fn new(mut engine: E, config: SweepConfig) -> TunnelResult<Self> {
        log::info!("Using radio model {}", config.radio_model);
        engine
            .set_radio_model(config.radio_model)
            .with_context(|| format!("Failed to set radio model {}", config.radio_model))?;

        Ok(Self {
            engine,
            domain: config.domain,
            runner: ScenarioRunner::new(config.scenario),
            shutdown_listener: None,
            progress: None,
        })
    }

    /// Stop between points once shutdown has been requested.
    pub fn with_shutdown_listener(mut self, listener: ShutdownListener) -> Self {
        self.shutdown_listener = Some(listener);
        self
    }

    /// Advance this bar once per completed point.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn domain(&self) -> &[u8] {
        &self.domain
    }

    /// Non-ideal points in sweep order, accuracy in the outer loop.
    pub fn points(&self) -> Vec<SweepParameter> {
        self.domain
            .iter()
            .cartesian_product(self.domain.iter())
            .map(|(accuracy, uncertainty)| SweepParameter::new(*accuracy, *uncertainty))
            .collect()
    }

    /// Number of scenarios [SweepOrchestrator::run] executes, including the baseline.
    pub fn total_runs(&self) -> usize {
        1 + self.domain.len() * self.domain.len()
    }

    /// Run the full sweep with coordinated listening.
    ///
    /// Any failing point aborts the sweep. No table is produced in that case.
    pub fn run(&mut self) -> TunnelResult<ResultTable> {
        let points = self
            .points()
            .into_iter()
            .map(|parameter| (parameter, ListeningMode::Coordinated))
            .collect::<Vec<_>>();

        self.run_points(&points)
    }

    /// Measure the coordinated listening baseline followed by the given points, in order.
    pub fn run_points(
        &mut self,
        points: &[(SweepParameter, ListeningMode)],
    ) -> TunnelResult<ResultTable> {
        log::info!(
            "Running {} scenario(s) over domain {:?}",
            points.len() + 1,
            self.domain
        );

        let baseline = self.measure(SweepParameter::IDEAL, ListeningMode::Coordinated)?;
        let ideal_active_time_ms = baseline.active_time_ms;
        log::info!("Ideal baseline active time is {ideal_active_time_ms} ms");

        let mut table = ResultTable::new(ResultRow::baseline(SweepParameter::IDEAL, baseline));

        for (parameter, mode) in points {
            let sample = self.measure(*parameter, *mode)?;
            let row = ResultRow::relative_to(*parameter, sample, ideal_active_time_ms);
            log::info!(
                "{parameter}: active {} ms, sleep {} ms, increase {} ms",
                row.active_time_ms,
                row.sleep_time_ms,
                row.active_delta_ms
            );
            table.push(row);
        }

        if let Some(progress) = &self.progress {
            progress.finish_and_clear();
        }

        Ok(table)
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    fn measure(
        &mut self,
        parameter: SweepParameter,
        mode: ListeningMode,
    ) -> TunnelResult<StatsSample> {
        if let Some(listener) = &self.shutdown_listener {
            if listener.should_shutdown() {
                log::warn!("Shutdown requested, stopping before {parameter}");
                return Err(ShutdownSignalError::default().into());
            }
        }

        log::info!("Measuring {parameter}");
        let outcome = self
            .runner
            .run(&mut self.engine, parameter, mode)
            .with_context(|| format!("Sweep point {parameter} failed"))?;

        let config = self.runner.config();
        let window_ms = config.measurement_window.as_millis() as u64;
        let tolerance_ms = config.window_tolerance.as_millis() as u64;
        if !outcome.sample.covers_window(window_ms, tolerance_ms) {
            log::warn!(
                "Counters for {parameter} cover {} ms of a {window_ms} ms window",
                outcome.sample.covered_ms()
            );
        }

        if let Some(progress) = &self.progress {
            progress.inc(1);
        }

        Ok(outcome.sample)
    }
}
