use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use csl_tunnel_core::prelude::SweepParameter;

use crate::engine::RadioModel;

#[derive(Parser, Debug, Clone, Default)]
#[command(about, long_about = None)]
pub struct SweepCli {
    /// Path to the simulator binary.
    ///
    /// If not set, the engine binding decides where to find it, usually from an environment
    /// variable or the user's `PATH`.
    #[clap(long)]
    pub otns_path: Option<PathBuf>,

    /// The radio propagation model to simulate. One of `Ideal`, `Ideal_Rssi`, `MutualInterference`,
    /// `MIDisc` or `Outdoor`.
    #[clap(long, value_parser = parse_radio_model)]
    pub radio_model: Option<RadioModel>,

    /// Override the values swept for both accuracy and uncertainty, for example `--domain 1,10,255`.
    ///
    /// The values are swept in the order given.
    #[clap(long, value_delimiter = ',')]
    pub domain: Option<Vec<u8>>,

    /// Simulation speed, a multiple of real time or `max`.
    #[clap(long, default_value = "max")]
    pub speed: String,

    /// Also write the result table as JSON to this path.
    #[clap(long)]
    pub json_out: Option<PathBuf>,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at by anyone and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,

    /// Measure a single `accuracy,uncertainty` point against the ideal baseline instead of running
    /// the full sweep.
    #[clap(long, value_parser = parse_sweep_point)]
    pub point: Option<SweepParameter>,

    /// Measure `--point` with coordinated listening off, using a short poll period instead.
    #[clap(long, default_value = "false", requires = "point")]
    pub polling: bool,
}

fn parse_radio_model(s: &str) -> anyhow::Result<RadioModel> {
    s.parse()
}

fn parse_sweep_point(s: &str) -> anyhow::Result<SweepParameter> {
    let (accuracy, uncertainty) = s
        .split_once(',')
        .ok_or(anyhow::anyhow!("Expected a point as `accuracy,uncertainty`"))?;

    let accuracy = accuracy
        .trim()
        .parse::<u8>()
        .with_context(|| format!("Invalid accuracy [{accuracy}]"))?;
    let uncertainty = uncertainty
        .trim()
        .parse::<u8>()
        .with_context(|| format!("Invalid uncertainty [{uncertainty}]"))?;

    Ok(SweepParameter::new(accuracy, uncertainty))
}
