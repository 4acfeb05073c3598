use crate::engine::{NodeId, NodeKind, SimulationEngine};
use crate::types::TunnelResult;

/// Holds the nodes a scenario added to the simulation and removes them again.
///
/// Call [NodeLease::release] on the success path to see deletion errors. If the lease is dropped
/// without being released, for example because a scenario step failed, the nodes are deleted on
/// [Drop::drop] and any failure is logged.
pub struct NodeLease<'a, E: SimulationEngine + ?Sized> {
    engine: &'a mut E,
    nodes: Vec<NodeId>,
}

impl<'a, E: SimulationEngine + ?Sized> NodeLease<'a, E> {
    pub fn new(engine: &'a mut E) -> Self {
        Self {
            engine,
            nodes: Vec::with_capacity(2),
        }
    }

    /// Add a node which will be deleted when this lease is released.
    pub fn add_node(&mut self, kind: NodeKind, x: i32, y: i32) -> TunnelResult<NodeId> {
        let id = self.engine.add_node(kind, x, y)?;
        log::debug!("Added {kind} node {id} at ({x}, {y})");
        self.nodes.push(id);
        Ok(id)
    }

    pub fn engine(&mut self) -> &mut E {
        &mut *self.engine
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Delete the leased nodes, most recently added first.
    ///
    /// Every node is attempted even if an earlier deletion fails. The first failure is returned.
    pub fn release(mut self) -> TunnelResult<()> {
        self.delete_all()
    }

    fn delete_all(&mut self) -> TunnelResult<()> {
        let mut result = Ok(());
        while let Some(id) = self.nodes.pop() {
            match self.engine.delete_node(id) {
                Ok(()) => log::debug!("Deleted node {id}"),
                Err(e) => {
                    log::error!("Failed to delete node {id}: {e:?}");
                    if result.is_ok() {
                        result = Err(e);
                    }
                }
            }
        }
        result
    }
}

impl<E: SimulationEngine + ?Sized> Drop for NodeLease<'_, E> {
    fn drop(&mut self) {
        if !self.nodes.is_empty() {
            log::warn!("Releasing {} node(s) after an incomplete scenario", self.nodes.len());
            // Failures are already logged by delete_all.
            let _ = self.delete_all();
        }
    }
}
