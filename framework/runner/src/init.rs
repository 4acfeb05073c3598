use crate::cli::SweepCli;
use clap::Parser;

/// Initialise logging and parse the command line for a sweep binary.
pub fn init() -> SweepCli {
    env_logger::init();

    SweepCli::parse()
}
