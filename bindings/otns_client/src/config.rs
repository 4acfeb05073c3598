use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use csl_tunnel_runner::prelude::{TunnelResult, DEFAULT_SPEED};

/// Default wall-clock time to wait for the simulator to answer a command.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Names the `otns` binary when no path is configured on the builder.
pub const OTNS_PATH_ENV: &str = "CSL_TUNNEL_OTNS_PATH";

/// Name the simulator is looked up by on `PATH` when nothing else is configured.
const OTNS_BIN_NAME: &str = "otns";

/// Used to build an [`OtnsConfig`], which is then passed to [`crate::OtnsClient::start`].
#[derive(Debug, Clone, Default)]
pub struct OtnsConfigBuilder {
    /// The path to the `otns` binary.
    ///
    /// If [`None`] when [`Self::build`] is called then [`OTNS_PATH_ENV`] is used, and failing
    /// that `otns` is looked up on `PATH`.
    bin_path: Option<PathBuf>,

    /// Simulation speed, `max` or a positive multiple of real time.
    speed: Option<String>,

    /// Log level of the simulator itself.
    log_level: Option<String>,

    /// How long to wait for a command to complete, on top of any simulated time it advances.
    read_timeout: Option<Duration>,

    /// Extra arguments appended to the simulator command line.
    extra_args: Vec<String>,
}

impl OtnsConfigBuilder {
    pub fn with_bin_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.bin_path = Some(path.into());
        self
    }

    pub fn with_speed(mut self, speed: impl Into<String>) -> Self {
        self.speed = Some(speed.into());
        self
    }

    pub fn with_log_level(mut self, log_level: impl Into<String>) -> Self {
        self.log_level = Some(log_level.into());
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = Some(read_timeout);
        self
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Build an [`OtnsConfig`], applying defaults where values were not set.
    pub fn build(self) -> TunnelResult<OtnsConfig> {
        let speed = self.speed.unwrap_or(DEFAULT_SPEED.to_string());
        let valid_speed = speed.eq_ignore_ascii_case("max")
            || speed.parse::<f64>().is_ok_and(|s| s.is_finite() && s > 0.0);
        if !valid_speed {
            bail!("Invalid simulation speed [{speed}], expected `max` or a positive number");
        }

        let bin_path = resolve_bin_path(self.bin_path)?;
        log::debug!("Using simulator binary '{}'", bin_path.display());

        Ok(OtnsConfig {
            bin_path,
            speed,
            log_level: self.log_level.unwrap_or("warn".to_string()),
            read_timeout: self.read_timeout.unwrap_or(DEFAULT_READ_TIMEOUT),
            extra_args: self.extra_args,
        })
    }
}

/// Pick the simulator binary: the configured path, then [`OTNS_PATH_ENV`], then `PATH`.
///
/// A bare name such as `otns` is looked up on `PATH` wherever it came from. Anything else must
/// exist as given.
fn resolve_bin_path(configured: Option<PathBuf>) -> TunnelResult<PathBuf> {
    let candidate = match configured {
        Some(path) => path,
        None => match env::var_os(OTNS_PATH_ENV) {
            Some(value) if value.is_empty() => bail!("'{OTNS_PATH_ENV}' is set but empty"),
            Some(value) => PathBuf::from(value),
            None => PathBuf::from(OTNS_BIN_NAME),
        },
    };

    let bare_name = candidate
        .parent()
        .is_some_and(|parent| parent.as_os_str().is_empty());
    if bare_name {
        return which::which(&candidate).with_context(|| {
            format!(
                "Simulator '{}' not found on PATH. Install OTNS, pass --otns-path or set '{OTNS_PATH_ENV}'",
                candidate.display()
            )
        });
    }

    if !candidate.exists() {
        bail!("Simulator binary '{}' does not exist", candidate.display());
    }
    Ok(candidate)
}

/// How to launch the simulator. Create with [`OtnsConfigBuilder`].
#[derive(Debug, Clone)]
pub struct OtnsConfig {
    pub(crate) bin_path: PathBuf,
    pub(crate) speed: String,
    pub(crate) log_level: String,
    pub(crate) read_timeout: Duration,
    pub(crate) extra_args: Vec<String>,
}

impl OtnsConfig {
    pub fn bin_path(&self) -> &PathBuf {
        &self.bin_path
    }

    /// Command line for a headless simulator that only advances time on `go`.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-autogo=false".to_string(),
            "-web=false".to_string(),
            "-speed".to_string(),
            self.speed.clone(),
            "-log".to_string(),
            self.log_level.clone(),
            "-no-pcap".to_string(),
            "-no-replay".to_string(),
            "-no-logfile".to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }
}
