use std::path::PathBuf;

use anyhow::anyhow;
use csl_tunnel_core::prelude::SweepParameter;

use crate::cli::SweepCli;
use crate::context::RunnerContext;
use crate::engine::{RadioModel, SimulationEngine};
use crate::init::init;
use crate::scenario::{ListeningMode, ScenarioConfig};
use crate::sweep::{SweepConfig, DEFAULT_DOMAIN};
use crate::types::TunnelResult;

/// Simulation speed used when none is given.
pub const DEFAULT_SPEED: &str = "max";

/// Creates the simulation engine for a run. Called once, after the runtime has been set up.
pub type EngineFactory = fn(&RunnerContext) -> TunnelResult<Box<dyn SimulationEngine>>;

/// The builder for a sweep definition.
///
/// This must be used at the start of a sweep binary to describe the sweep that you want to run.
pub struct SweepDefinitionBuilder {
    /// The name of the sweep, used in logs and in the JSON report.
    ///
    /// Recommended value is `env!("CARGO_PKG_NAME")`.
    name: String,
    /// Command line options, which take precedence over the defaults set on this builder.
    cli: SweepCli,
    /// Domain swept when `--domain` is not given.
    default_domain: Vec<u8>,
    /// Radio model used when `--radio-model` is not given.
    default_radio_model: RadioModel,
    scenario_config: ScenarioConfig,
    engine_factory: Option<EngineFactory>,
}

/// What a run does once the engine is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    /// Baseline plus every pair of the domain.
    Full,
    /// Baseline plus one point, in the given listening mode.
    SinglePoint {
        parameter: SweepParameter,
        mode: ListeningMode,
    },
}

pub struct SweepDefinition {
    pub name: String,
    pub config: SweepConfig,
    pub mode: SweepMode,
    pub engine_factory: EngineFactory,
    pub simulator_path: Option<PathBuf>,
    pub speed: String,
    pub json_out: Option<PathBuf>,
    pub no_progress: bool,
}

impl SweepDefinitionBuilder {
    /// Initialise a new sweep definition from the sweep name and parsed command line arguments.
    /// See the [SweepDefinitionBuilder::name] for more information about the name.
    pub fn new(name: &str, cli: SweepCli) -> Self {
        Self {
            name: name.to_string(),
            cli,
            default_domain: DEFAULT_DOMAIN.to_vec(),
            default_radio_model: RadioModel::default(),
            scenario_config: ScenarioConfig::default(),
            engine_factory: None,
        }
    }

    /// Initialise logging, parse the command line and create a new sweep definition.
    pub fn new_with_init(name: &str) -> Self {
        Self::new(name, init())
    }

    /// Set the domain [SweepDefinitionBuilder::default_domain] used for both accuracy and uncertainty.
    pub fn with_default_domain(mut self, domain: &[u8]) -> Self {
        self.default_domain = domain.to_vec();
        self
    }

    /// Set the radio model [SweepDefinitionBuilder::default_radio_model].
    pub fn with_default_radio_model(mut self, radio_model: RadioModel) -> Self {
        self.default_radio_model = radio_model;
        self
    }

    /// Replace the scenario geometry and timing.
    pub fn with_scenario_config(mut self, scenario_config: ScenarioConfig) -> Self {
        self.scenario_config = scenario_config;
        self
    }

    /// Set the factory for the simulation engine the sweep runs against.
    pub fn use_engine(mut self, engine_factory: EngineFactory) -> Self {
        self.engine_factory = Some(engine_factory);
        self
    }

    pub(crate) fn build(self) -> TunnelResult<SweepDefinition> {
        let engine_factory = self
            .engine_factory
            .ok_or(anyhow!("No simulation engine configured for sweep [{}]", self.name))?;

        let mode = match self.cli.point {
            Some(parameter) => SweepMode::SinglePoint {
                parameter,
                mode: if self.cli.polling {
                    ListeningMode::Polling
                } else {
                    ListeningMode::Coordinated
                },
            },
            None if self.cli.polling => {
                anyhow::bail!("Polling mode can only be used with a single point");
            }
            None => SweepMode::Full,
        };

        let domain = self.cli.domain.unwrap_or(self.default_domain);
        if mode == SweepMode::Full && domain.is_empty() {
            log::warn!("Empty sweep domain, only the ideal baseline will be measured");
        }

        Ok(SweepDefinition {
            name: self.name,
            config: SweepConfig {
                domain,
                radio_model: self.cli.radio_model.unwrap_or(self.default_radio_model),
                scenario: self.scenario_config,
            },
            mode,
            engine_factory,
            simulator_path: self.cli.otns_path,
            speed: if self.cli.speed.is_empty() {
                DEFAULT_SPEED.to_string()
            } else {
                self.cli.speed
            },
            json_out: self.cli.json_out,
            no_progress: self.cli.no_progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_engine(_ctx: &RunnerContext) -> TunnelResult<Box<dyn SimulationEngine>> {
        anyhow::bail!("not used")
    }

    #[test]
    fn engine_is_required() {
        let result = SweepDefinitionBuilder::new("no_engine", SweepCli::default()).build();
        assert!(result.is_err());
    }

    #[test]
    fn command_line_overrides_defaults() -> anyhow::Result<()> {
        let cli = SweepCli {
            domain: Some(vec![5, 7]),
            radio_model: Some(RadioModel::Outdoor),
            ..Default::default()
        };

        let definition = SweepDefinitionBuilder::new("overrides", cli)
            .with_default_domain(&[1, 2, 3])
            .with_default_radio_model(RadioModel::Ideal)
            .use_engine(no_engine)
            .build()?;

        assert_eq!(vec![5, 7], definition.config.domain);
        assert_eq!(RadioModel::Outdoor, definition.config.radio_model);
        assert_eq!(SweepMode::Full, definition.mode);
        Ok(())
    }

    #[test]
    fn defaults_apply_without_command_line() -> anyhow::Result<()> {
        let definition = SweepDefinitionBuilder::new("defaults", SweepCli::default())
            .with_default_domain(&[1, 2, 3])
            .with_default_radio_model(RadioModel::Ideal)
            .use_engine(no_engine)
            .build()?;

        assert_eq!(vec![1, 2, 3], definition.config.domain);
        assert_eq!(RadioModel::Ideal, definition.config.radio_model);
        Ok(())
    }

    #[test]
    fn single_point_in_polling_mode() -> anyhow::Result<()> {
        let cli = SweepCli {
            point: Some(SweepParameter::new(50, 100)),
            polling: true,
            ..Default::default()
        };

        let definition = SweepDefinitionBuilder::new("single", cli)
            .use_engine(no_engine)
            .build()?;

        assert_eq!(
            SweepMode::SinglePoint {
                parameter: SweepParameter::new(50, 100),
                mode: ListeningMode::Polling
            },
            definition.mode
        );
        Ok(())
    }

    #[test]
    fn polling_without_point_is_rejected() {
        let cli = SweepCli {
            polling: true,
            ..Default::default()
        };

        let result = SweepDefinitionBuilder::new("bad", cli)
            .use_engine(no_engine)
            .build();
        assert!(result.is_err());
    }
}
