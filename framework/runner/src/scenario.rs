use std::time::Duration;

use anyhow::Context;
use csl_tunnel_core::prelude::{StatsSample, SweepParameter};

use crate::engine::{NodeKind, SimulationEngine};
use crate::lease::NodeLease;
use crate::stats::extract_stats;
use crate::types::TunnelResult;

/// How the listener is told to receive data from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListeningMode {
    /// Coordinated sampled listening. The listener wakes on a schedule agreed with the timing
    /// source and only polls rarely.
    Coordinated,
    /// Coordinated listening off. The listener wakes up to poll its parent on a short period.
    Polling,
}

/// Fixed geometry and timing of the two node scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    pub source_position: (i32, i32),
    /// Out of range-overlap distance from the source, within the connectivity radius.
    pub listener_position: (i32, i32),
    /// Time given to the timing source, and again to the listener, to settle.
    pub warm_up: Duration,
    /// How long radio usage is collected for.
    pub measurement_window: Duration,
    /// How far `active + sleep` may stray from the window before a measurement is suspicious.
    pub window_tolerance: Duration,
    /// Poll period used with [ListeningMode::Polling], in milliseconds.
    pub polling_period_ms: u32,
    /// Poll period used with [ListeningMode::Coordinated], in milliseconds.
    pub coordinated_poll_period_ms: u32,
    /// Coordinated listening timeout, in seconds.
    pub csl_timeout_s: u32,
    /// Coordinated listening period, in microseconds.
    pub csl_period_us: u32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            source_position: (100, 100),
            listener_position: (220, 100),
            warm_up: Duration::from_secs(10),
            measurement_window: Duration::from_secs(60),
            window_tolerance: Duration::from_secs(1),
            polling_period_ms: 1000,
            coordinated_poll_period_ms: 240_000,
            csl_timeout_s: 240,
            csl_period_us: 1_000_000,
        }
    }
}

/// Device CLI commands understood by the simulated firmware.
pub mod commands {
    pub fn csl_accuracy(ppm: u8) -> String {
        format!("csl accuracy {ppm}")
    }

    pub fn csl_uncertainty(units_of_10us: u8) -> String {
        format!("csl uncertainty {units_of_10us}")
    }

    pub fn poll_period(ms: u32) -> String {
        format!("pollperiod {ms}")
    }

    pub fn csl_timeout(s: u32) -> String {
        format!("csl timeout {s}")
    }

    pub fn csl_period(us: u32) -> String {
        format!("csl period {us}")
    }

    pub const RADIO_STATS_CLEAR: &str = "radio stats clear";
    pub const RADIO_STATS: &str = "radio stats";
}

/// The measurement of one scenario, tagged with the parameter that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioOutcome {
    pub parameter: SweepParameter,
    pub sample: StatsSample,
}

/// Builds the timing source plus listener scenario for one parameter pair and measures the
/// listener's radio usage.
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    config: ScenarioConfig,
}

impl ScenarioRunner {
    pub fn new(config: ScenarioConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Run one scenario to completion.
    ///
    /// Both nodes are removed from the engine before this returns, whether or not the scenario
    /// succeeded. The engine must not be shared with another scenario while this runs.
    pub fn run<E: SimulationEngine + ?Sized>(
        &self,
        engine: &mut E,
        parameter: SweepParameter,
        mode: ListeningMode,
    ) -> TunnelResult<ScenarioOutcome> {
        let config = &self.config;
        let mut lease = NodeLease::new(engine);

        let (x, y) = config.source_position;
        let source = lease.add_node(NodeKind::Router, x, y)?;
        lease
            .engine()
            .node_cmd(source, &commands::csl_accuracy(parameter.accuracy))?;
        lease
            .engine()
            .node_cmd(source, &commands::csl_uncertainty(parameter.uncertainty))?;
        lease.engine().go(config.warm_up)?;

        let (x, y) = config.listener_position;
        let listener = lease.add_node(NodeKind::Sed, x, y)?;
        match mode {
            ListeningMode::Polling => {
                lease
                    .engine()
                    .node_cmd(listener, &commands::poll_period(config.polling_period_ms))?;
            }
            ListeningMode::Coordinated => {
                let engine = lease.engine();
                engine.node_cmd(
                    listener,
                    &commands::poll_period(config.coordinated_poll_period_ms),
                )?;
                engine.node_cmd(listener, &commands::csl_timeout(config.csl_timeout_s))?;
                engine.node_cmd(listener, &commands::csl_period(config.csl_period_us))?;
            }
        }
        lease.engine().go(config.warm_up)?;
        lease
            .engine()
            .assert_partition_count(1)
            .context("Nodes did not form a single partition during warm-up")?;

        lease
            .engine()
            .node_cmd(listener, commands::RADIO_STATS_CLEAR)?;
        lease.engine().go(config.measurement_window)?;
        let stats = lease.engine().node_cmd(listener, commands::RADIO_STATS)?;

        lease.release()?;

        let sample = extract_stats(&stats)?;
        log::debug!("Measured {parameter} in {mode:?} mode: {sample:?}");

        Ok(ScenarioOutcome { parameter, sample })
    }
}
