#![allow(dead_code)]

use std::collections::BTreeMap;
use std::time::Duration;

use csl_tunnel_runner::prelude::*;

/// How the stub derives the listener's radio usage from the timing source's settings.
pub type StatsModel = fn(SweepParameter) -> StatsSample;

/// Reports the same usage for every parameter.
pub fn constant_stats(_parameter: SweepParameter) -> StatsSample {
    StatsSample::new(500, 59500)
}

/// More drift and more slack mean a longer receive window on every wake-up.
pub fn slack_proportional_stats(parameter: SweepParameter) -> StatsSample {
    let active = 500 + 2 * u64::from(parameter.accuracy) + 3 * u64::from(parameter.uncertainty);
    StatsSample::new(active, 60_000 - active)
}

/// An in-process stand-in for the network simulator. Records what it is asked to do and answers
/// `radio stats` from a [StatsModel].
pub struct StubEngine {
    pub radio_models: Vec<RadioModel>,
    pub commands: Vec<(NodeId, String)>,
    pub live_nodes: BTreeMap<NodeId, NodeKind>,
    pub deleted_nodes: Vec<NodeId>,
    pub scenarios_started: usize,
    pub simulated: Duration,
    /// 1-based scenario number whose partition check reports a split topology.
    pub split_on_scenario: Option<usize>,
    /// Replace the radio stats response with these lines.
    pub stats_override: Option<Vec<String>>,
    stats_model: StatsModel,
    next_id: NodeId,
    accuracy: u8,
    uncertainty: u8,
}

impl StubEngine {
    pub fn new(stats_model: StatsModel) -> Self {
        Self {
            radio_models: vec![],
            commands: vec![],
            live_nodes: BTreeMap::new(),
            deleted_nodes: vec![],
            scenarios_started: 0,
            simulated: Duration::ZERO,
            split_on_scenario: None,
            stats_override: None,
            stats_model,
            next_id: 0,
            accuracy: 0,
            uncertainty: 0,
        }
    }

    pub fn commands_for(&self, id: NodeId) -> Vec<&str> {
        self.commands
            .iter()
            .filter(|(node, _)| *node == id)
            .map(|(_, cmd)| cmd.as_str())
            .collect()
    }
}

impl SimulationEngine for StubEngine {
    fn set_radio_model(&mut self, model: RadioModel) -> TunnelResult<()> {
        self.radio_models.push(model);
        Ok(())
    }

    fn add_node(&mut self, kind: NodeKind, _x: i32, _y: i32) -> TunnelResult<NodeId> {
        if kind == NodeKind::Router {
            self.scenarios_started += 1;
        }
        self.next_id += 1;
        self.live_nodes.insert(self.next_id, kind);
        Ok(self.next_id)
    }

    fn delete_node(&mut self, id: NodeId) -> TunnelResult<()> {
        self.live_nodes
            .remove(&id)
            .ok_or(anyhow::anyhow!("Node {id} does not exist"))?;
        self.deleted_nodes.push(id);
        Ok(())
    }

    fn node_cmd(&mut self, id: NodeId, cmd: &str) -> TunnelResult<Vec<String>> {
        if !self.live_nodes.contains_key(&id) {
            anyhow::bail!("Node {id} does not exist");
        }
        self.commands.push((id, cmd.to_string()));

        if let Some(value) = cmd.strip_prefix("csl accuracy ") {
            self.accuracy = value.parse()?;
        } else if let Some(value) = cmd.strip_prefix("csl uncertainty ") {
            self.uncertainty = value.parse()?;
        } else if cmd == "radio stats" {
            if let Some(lines) = &self.stats_override {
                return Ok(lines.clone());
            }
            let sample =
                (self.stats_model)(SweepParameter::new(self.accuracy, self.uncertainty));
            return Ok(vec![
                "Radio Statistics:".to_string(),
                format!(
                    "Total Time: {}.000s",
                    (sample.active_time_ms + sample.sleep_time_ms) / 1000
                ),
                "Tx Time: 0.000s (0.00%)".to_string(),
                format!(
                    "Rx Time: {}.{:03}s",
                    sample.active_time_ms / 1000,
                    sample.active_time_ms % 1000
                ),
                format!(
                    "Sleep Time: {}.{:03}s",
                    sample.sleep_time_ms / 1000,
                    sample.sleep_time_ms % 1000
                ),
                "Disabled Time: 0.000s (0.00%)".to_string(),
            ]);
        }

        Ok(vec![])
    }

    fn go(&mut self, duration: Duration) -> TunnelResult<()> {
        self.simulated += duration;
        Ok(())
    }

    fn partitions(&mut self) -> TunnelResult<Vec<Partition>> {
        let nodes = self.live_nodes.keys().copied().collect::<Vec<_>>();
        if self.split_on_scenario == Some(self.scenarios_started) {
            return Ok(nodes
                .into_iter()
                .enumerate()
                .map(|(i, node)| Partition {
                    id: 0x100 + i as u32,
                    nodes: vec![node],
                })
                .collect());
        }

        Ok(vec![Partition {
            id: 0xdead_beef,
            nodes,
        }])
    }
}
