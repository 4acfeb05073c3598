//! Provides the ability to run the OpenThread network simulator as a [`Child`] process and drive
//! it through its interactive command line.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use csl_tunnel_runner::prelude::{
    Executor, NodeId, NodeKind, Partition, RadioModel, SimulationEngine, TunnelResult,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::config::OtnsConfig;
use crate::response::{parse_node_id, parse_partitions, read_response};

/// How long the simulator gets to exit after being asked to, before it is killed.
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// A running simulator. Every [`SimulationEngine`] call blocks until the simulator has answered.
///
/// The simulator is asked to exit when this is dropped, and killed if it does not.
#[derive(Debug)]
pub struct OtnsClient {
    executor: Arc<Executor>,
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    read_timeout: Duration,
}

impl OtnsClient {
    /// Start the simulator described by `config`.
    pub fn start(executor: Arc<Executor>, config: &OtnsConfig) -> TunnelResult<Self> {
        log::info!(
            "Starting simulator '{}' at speed {}",
            config.bin_path().display(),
            config.speed
        );

        let mut child = executor.execute_in_place(async {
            Command::new(config.bin_path())
                .args(config.args())
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .with_context(|| {
                    format!("Failed to run simulator '{}'", config.bin_path().display())
                })
        })?;

        let stdin = child
            .stdin
            .take()
            .context("Failed to get stdin for the running simulator")?;
        let stdout = child
            .stdout
            .take()
            .context("Failed to get stdout for the running simulator")?;

        if let Some(stderr) = child.stderr.take() {
            executor.spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    log::info!(target: "otns", "{line}");
                }
            });
        }

        Ok(Self {
            executor,
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            read_timeout: config.read_timeout(),
        })
    }

    /// Send one command and collect its output, waiting at most `wait` for it to complete.
    pub fn command(&mut self, command: &str, wait: Duration) -> TunnelResult<Vec<String>> {
        log::debug!(target: "otns", "> {command}");

        let stdin = &mut self.stdin;
        let stdout = &mut self.stdout;
        self.executor.execute_with_deadline(wait, command, async move {
            stdin
                .write_all(format!("{command}\n").as_bytes())
                .await
                .with_context(|| format!("Failed to send `{command}` to the simulator"))?;
            stdin.flush().await?;

            read_response(command, stdout).await
        })
    }
}

impl SimulationEngine for OtnsClient {
    fn set_radio_model(&mut self, model: RadioModel) -> TunnelResult<()> {
        self.command(&format!("radiomodel {model}"), self.read_timeout)?;
        Ok(())
    }

    fn add_node(&mut self, kind: NodeKind, x: i32, y: i32) -> TunnelResult<NodeId> {
        let command = format!("add {kind} x {x} y {y}");
        let output = self.command(&command, self.read_timeout)?;
        Ok(parse_node_id(&command, &output)?)
    }

    fn delete_node(&mut self, id: NodeId) -> TunnelResult<()> {
        self.command(&format!("del {id}"), self.read_timeout)?;
        Ok(())
    }

    fn node_cmd(&mut self, id: NodeId, cmd: &str) -> TunnelResult<Vec<String>> {
        self.command(&format!("node {id} \"{cmd}\""), self.read_timeout)
    }

    fn go(&mut self, duration: Duration) -> TunnelResult<()> {
        // At low speeds simulated time costs wall time as well.
        let wait = self.read_timeout + duration;
        self.command(&format!("go {}", duration.as_secs_f64()), wait)?;
        Ok(())
    }

    fn partitions(&mut self) -> TunnelResult<Vec<Partition>> {
        let output = self.command("partitions", self.read_timeout)?;
        Ok(parse_partitions("partitions", &output)?)
    }
}

impl Drop for OtnsClient {
    fn drop(&mut self) {
        log::trace!("Stopping the simulator");

        let stdin = &mut self.stdin;
        let child = &mut self.child;
        let result = self.executor.execute_with_deadline(EXIT_GRACE, "exit", async move {
            stdin.write_all(b"exit\n").await?;
            stdin.flush().await?;
            Ok::<_, anyhow::Error>(child.wait().await?)
        });

        match result {
            Ok(status) => log::info!("Simulator exited with {status}"),
            Err(err) => {
                log::warn!("Simulator did not exit cleanly, killing it: {err}");
                if let Err(err) = self.child.start_kill() {
                    log::error!("Failed to kill the simulator: {err}");
                }
            }
        }
    }
}
