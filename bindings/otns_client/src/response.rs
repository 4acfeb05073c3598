//! The OTNS command line answers every command with zero or more output lines followed by either
//! `Done` or a line starting with `Error`.

use anyhow::{anyhow, Context};
use csl_tunnel_runner::prelude::{NodeId, Partition};
use tokio::io::{AsyncBufRead, Lines};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OtnsCliError {
    #[error("Simulator rejected `{command}`: {message}")]
    Rejected { command: String, message: String },
    #[error("Unexpected response to `{command}`: {lines:?}")]
    Unexpected { command: String, lines: Vec<String> },
}

#[derive(Debug, PartialEq, Eq)]
enum ResponseLine<'a> {
    Done,
    Error(&'a str),
    Output(&'a str),
}

fn classify(line: &str) -> ResponseLine<'_> {
    // Interactive prompt, printed before some responses.
    let line = line.trim_start_matches("> ").trim_end();

    if line == "Done" {
        ResponseLine::Done
    } else if let Some(message) = line.strip_prefix("Error") {
        ResponseLine::Error(message.trim_start_matches(':').trim())
    } else {
        ResponseLine::Output(line)
    }
}

/// Read the output of `command` up to its completion marker.
pub(crate) async fn read_response<R: AsyncBufRead + Unpin>(
    command: &str,
    lines: &mut Lines<R>,
) -> anyhow::Result<Vec<String>> {
    let mut output = Vec::new();
    loop {
        let line = lines
            .next_line()
            .await
            .context("Failed to read from the simulator")?
            .ok_or(anyhow!("Simulator exited while running `{command}`"))?;

        match classify(&line) {
            ResponseLine::Done => return Ok(output),
            ResponseLine::Error(message) => {
                return Err(OtnsCliError::Rejected {
                    command: command.to_string(),
                    message: message.to_string(),
                }
                .into());
            }
            ResponseLine::Output("") => {}
            ResponseLine::Output(text) => {
                log::trace!(target: "otns", "{text}");
                output.push(text.to_string());
            }
        }
    }
}

/// `add` answers with the id of the new node.
pub(crate) fn parse_node_id(command: &str, lines: &[String]) -> Result<NodeId, OtnsCliError> {
    lines
        .first()
        .and_then(|line| line.trim().parse::<NodeId>().ok())
        .ok_or_else(|| OtnsCliError::Unexpected {
            command: command.to_string(),
            lines: lines.to_vec(),
        })
}

/// `partitions` answers with one `partition=<hex id>\tnodes=<id>,<id>,...` line per partition.
pub(crate) fn parse_partitions(
    command: &str,
    lines: &[String],
) -> Result<Vec<Partition>, OtnsCliError> {
    let unexpected = || OtnsCliError::Unexpected {
        command: command.to_string(),
        lines: lines.to_vec(),
    };

    lines
        .iter()
        .map(|line| {
            let mut fields = line.split_whitespace();
            let id = fields
                .next()
                .and_then(|f| f.strip_prefix("partition="))
                .and_then(|id| u32::from_str_radix(id, 16).ok())
                .ok_or_else(unexpected)?;
            let nodes = fields
                .next()
                .and_then(|f| f.strip_prefix("nodes="))
                .ok_or_else(unexpected)?
                .split(',')
                .filter(|n| !n.is_empty())
                .map(|n| n.parse::<NodeId>().map_err(|_| unexpected()))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Partition { id, nodes })
        })
        .collect()
}
