use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use anyhow::bail;

use crate::types::TunnelResult;

/// Identifier handed out by the simulator when a node is added. Valid until the node is deleted.
pub type NodeId = u32;

/// The device roles the harness knows how to add to a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Router,
    Fed,
    Med,
    /// Sleepy end device, the battery constrained listener.
    Sed,
    Ssed,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Router => "router",
            NodeKind::Fed => "fed",
            NodeKind::Med => "med",
            NodeKind::Sed => "sed",
            NodeKind::Ssed => "ssed",
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Radio propagation model of the simulator. Applied once per process, before any scenario runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RadioModel {
    Ideal,
    IdealRssi,
    #[default]
    MutualInterference,
    MutualInterferenceDisc,
    Outdoor,
}

impl RadioModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RadioModel::Ideal => "Ideal",
            RadioModel::IdealRssi => "Ideal_Rssi",
            RadioModel::MutualInterference => "MutualInterference",
            RadioModel::MutualInterferenceDisc => "MIDisc",
            RadioModel::Outdoor => "Outdoor",
        }
    }
}

impl Display for RadioModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RadioModel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let model = match s.to_ascii_lowercase().as_str() {
            "ideal" => RadioModel::Ideal,
            "ideal_rssi" => RadioModel::IdealRssi,
            "mutualinterference" => RadioModel::MutualInterference,
            "midisc" => RadioModel::MutualInterferenceDisc,
            "outdoor" => RadioModel::Outdoor,
            _ => bail!("Unknown radio model [{s}]"),
        };

        Ok(model)
    }
}

/// A set of nodes that can all reach each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub id: u32,
    pub nodes: Vec<NodeId>,
}

impl Partition {
    /// Nodes that have not joined any network are reported under partition id 0.
    pub fn is_detached(&self) -> bool {
        self.id == 0
    }
}

/// Returned when the simulated topology did not settle into the expected number of partitions.
#[derive(derive_more::Error, derive_more::Display, Debug, PartialEq, Eq)]
#[display(
    "Expected {expected} formed partition(s) but found {formed}, with {detached_nodes} detached node(s)"
)]
pub struct TopologyError {
    pub expected: usize,
    pub formed: usize,
    pub detached_nodes: usize,
}

/// The capabilities the harness needs from a network simulator.
///
/// Every call is blocking. Advancing time returns once the simulator has processed everything
/// scheduled within the interval. An engine holds a single shared topology, so calls must not be
/// interleaved between scenarios.
pub trait SimulationEngine {
    /// Select the radio propagation model.
    fn set_radio_model(&mut self, model: RadioModel) -> TunnelResult<()>;

    /// Add a node of the given kind at a position, returning its id.
    fn add_node(&mut self, kind: NodeKind, x: i32, y: i32) -> TunnelResult<NodeId>;

    fn delete_node(&mut self, id: NodeId) -> TunnelResult<()>;

    /// Send a CLI command to a node and return its response lines, without the completion marker.
    fn node_cmd(&mut self, id: NodeId, cmd: &str) -> TunnelResult<Vec<String>>;

    /// Advance simulated time.
    fn go(&mut self, duration: Duration) -> TunnelResult<()>;

    fn partitions(&mut self) -> TunnelResult<Vec<Partition>>;

    /// Fail with a [TopologyError] unless exactly `expected` partitions have formed and no node is
    /// detached.
    fn assert_partition_count(&mut self, expected: usize) -> TunnelResult<()> {
        let partitions = self.partitions()?;
        let formed = partitions.iter().filter(|p| !p.is_detached()).count();
        let detached_nodes = partitions
            .iter()
            .filter(|p| p.is_detached())
            .map(|p| p.nodes.len())
            .sum();

        if formed != expected || detached_nodes > 0 {
            return Err(TopologyError {
                expected,
                formed,
                detached_nodes,
            }
            .into());
        }

        Ok(())
    }
}

impl<E: SimulationEngine + ?Sized> SimulationEngine for Box<E> {
    fn set_radio_model(&mut self, model: RadioModel) -> TunnelResult<()> {
        (**self).set_radio_model(model)
    }

    fn add_node(&mut self, kind: NodeKind, x: i32, y: i32) -> TunnelResult<NodeId> {
        (**self).add_node(kind, x, y)
    }

    fn delete_node(&mut self, id: NodeId) -> TunnelResult<()> {
        (**self).delete_node(id)
    }

    fn node_cmd(&mut self, id: NodeId, cmd: &str) -> TunnelResult<Vec<String>> {
        (**self).node_cmd(id, cmd)
    }

    fn go(&mut self, duration: Duration) -> TunnelResult<()> {
        (**self).go(duration)
    }

    fn partitions(&mut self) -> TunnelResult<Vec<Partition>> {
        (**self).partitions()
    }

    fn assert_partition_count(&mut self, expected: usize) -> TunnelResult<()> {
        (**self).assert_partition_count(expected)
    }
}

impl<E: SimulationEngine + ?Sized> SimulationEngine for &mut E {
    fn set_radio_model(&mut self, model: RadioModel) -> TunnelResult<()> {
        (**self).set_radio_model(model)
    }

    fn add_node(&mut self, kind: NodeKind, x: i32, y: i32) -> TunnelResult<NodeId> {
        (**self).add_node(kind, x, y)
    }

    fn delete_node(&mut self, id: NodeId) -> TunnelResult<()> {
        (**self).delete_node(id)
    }

    fn node_cmd(&mut self, id: NodeId, cmd: &str) -> TunnelResult<Vec<String>> {
        (**self).node_cmd(id, cmd)
    }

    fn go(&mut self, duration: Duration) -> TunnelResult<()> {
        (**self).go(duration)
    }

    fn partitions(&mut self) -> TunnelResult<Vec<Partition>> {
        (**self).partitions()
    }

    fn assert_partition_count(&mut self, expected: usize) -> TunnelResult<()> {
        (**self).assert_partition_count(expected)
    }
}
