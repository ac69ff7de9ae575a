use crate::domain::edge::EdgeKind;
use crate::domain::error::{EngineError, EntityRef, Result};
use crate::domain::node::{Node, Personality, Process, ProcessId, Resource, ResourceId};
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::BTreeMap;

/// Resource-allocation graph - the core data structure.
///
/// Nodes are processes and resources; `Request` edges run process → resource,
/// `Assignment` edges run resource → process. A stable graph keeps node
/// indices valid across removals.
#[derive(Debug, Clone, Default)]
pub struct AllocationGraph {
    graph: StableDiGraph<Node, EdgeKind>,
    processes: BTreeMap<ProcessId, NodeIndex>,
    resources: BTreeMap<ResourceId, NodeIndex>,
    next_process: u32,
    next_resource: u32,
}

impl AllocationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_process(&mut self, personality: Personality) -> ProcessId {
        self.next_process += 1;
        let id = ProcessId(self.next_process);
        let idx = self.graph.add_node(Node::Process(Process::new(id, personality)));
        self.processes.insert(id, idx);
        id
    }

    pub fn add_resource(&mut self) -> ResourceId {
        self.next_resource += 1;
        let id = ResourceId(self.next_resource);
        let idx = self.graph.add_node(Node::Resource(Resource { id }));
        self.resources.insert(id, idx);
        id
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_process(&self, id: ProcessId) -> bool {
        self.processes.contains_key(&id)
    }

    pub fn contains_resource(&self, id: ResourceId) -> bool {
        self.resources.contains_key(&id)
    }

    pub fn process(&self, id: ProcessId) -> Option<&Process> {
        let idx = self.processes.get(&id)?;
        self.graph.node_weight(*idx)?.as_process()
    }

    pub fn process_mut(&mut self, id: ProcessId) -> Option<&mut Process> {
        let idx = self.processes.get(&id)?;
        self.graph.node_weight_mut(*idx)?.as_process_mut()
    }

    /// Processes in ascending id order
    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.processes
            .values()
            .filter_map(|&idx| self.graph.node_weight(idx).and_then(Node::as_process))
    }

    pub fn process_ids(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.processes.keys().copied()
    }

    pub fn resource_ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.resources.keys().copied()
    }

    pub(crate) fn process_index(&self, id: ProcessId) -> Result<NodeIndex> {
        self.processes
            .get(&id)
            .copied()
            .ok_or(EngineError::UnknownEntity(EntityRef::Process(id)))
    }

    pub(crate) fn resource_index(&self, id: ResourceId) -> Result<NodeIndex> {
        self.resources
            .get(&id)
            .copied()
            .ok_or(EngineError::UnknownEntity(EntityRef::Resource(id)))
    }

    /// Process currently holding the resource, if any
    pub fn holder(&self, resource: ResourceId) -> Option<ProcessId> {
        let idx = *self.resources.get(&resource)?;
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .find(|e| *e.weight() == EdgeKind::Assignment)
            .and_then(|e| self.process_id_at(e.target()))
    }

    /// Resources held by the process, ascending
    pub fn held_by(&self, process: ProcessId) -> Vec<ResourceId> {
        self.linked_resources(process, Direction::Incoming, EdgeKind::Assignment)
    }

    /// Resources the process is waiting for, ascending
    pub fn requested_by(&self, process: ProcessId) -> Vec<ResourceId> {
        self.linked_resources(process, Direction::Outgoing, EdgeKind::Request)
    }

    /// Processes waiting for the resource, ascending
    pub fn waiters(&self, resource: ResourceId) -> Vec<ProcessId> {
        let Some(&idx) = self.resources.get(&resource) else {
            return Vec::new();
        };
        let mut out: Vec<ProcessId> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .filter(|e| *e.weight() == EdgeKind::Request)
            .filter_map(|e| self.process_id_at(e.source()))
            .collect();
        out.sort();
        out
    }

    pub fn has_request(&self, process: ProcessId, resource: ResourceId) -> bool {
        match (self.processes.get(&process), self.resources.get(&resource)) {
            (Some(&p), Some(&r)) => self.graph.find_edge(p, r).is_some(),
            _ => false,
        }
    }

    /// All edges as `(kind, process, resource)`, sorted
    pub fn edges(&self) -> Vec<(EdgeKind, ProcessId, ResourceId)> {
        let mut out = Vec::with_capacity(self.graph.edge_count());
        for e in self.graph.edge_indices() {
            let (Some((a, b)), Some(kind)) = (self.graph.edge_endpoints(e), self.graph.edge_weight(e))
            else {
                continue;
            };
            let (p, r) = match kind {
                EdgeKind::Request => (a, b),
                EdgeKind::Assignment => (b, a),
            };
            if let (Some(p), Some(r)) = (self.process_id_at(p), self.resource_id_at(r)) {
                out.push((*kind, p, r));
            }
        }
        out.sort_by_key(|&(kind, p, r)| (p, r, kind == EdgeKind::Request));
        out
    }

    /// Adds a request edge; returns false when it already existed.
    /// Callers validate ids and the no-self-wait rule first.
    pub(crate) fn insert_request(&mut self, process: NodeIndex, resource: NodeIndex) -> bool {
        if self.graph.find_edge(process, resource).is_some() {
            return false;
        }
        self.graph.add_edge(process, resource, EdgeKind::Request);
        true
    }

    pub(crate) fn drop_request(&mut self, process: NodeIndex, resource: NodeIndex) -> bool {
        match self.graph.find_edge(process, resource) {
            Some(e) => self.graph.remove_edge(e).is_some(),
            None => false,
        }
    }

    pub(crate) fn insert_assignment(&mut self, resource: NodeIndex, process: NodeIndex) {
        self.graph.add_edge(resource, process, EdgeKind::Assignment);
    }

    /// Removes the resource's assignment edge and returns the former holder
    pub(crate) fn drop_assignment(&mut self, resource: NodeIndex) -> Option<ProcessId> {
        let edge = self
            .graph
            .edges_directed(resource, Direction::Outgoing)
            .find(|e| *e.weight() == EdgeKind::Assignment)
            .map(|e| (e.id(), e.target()))?;
        let holder = self.process_id_at(edge.1);
        self.graph.remove_edge(edge.0);
        holder
    }

    /// Deletes the process and every incident edge. Returns the removed
    /// process and the resources it held (now free).
    pub(crate) fn remove_process(&mut self, id: ProcessId) -> Result<(Process, Vec<ResourceId>)> {
        let idx = self.process_index(id)?;
        let freed = self.held_by(id);
        self.processes.remove(&id);
        match self.graph.remove_node(idx) {
            Some(Node::Process(p)) => Ok((p, freed)),
            _ => Err(EngineError::UnknownEntity(EntityRef::Process(id))),
        }
    }

    fn linked_resources(
        &self,
        process: ProcessId,
        dir: Direction,
        kind: EdgeKind,
    ) -> Vec<ResourceId> {
        let Some(&idx) = self.processes.get(&process) else {
            return Vec::new();
        };
        let mut out: Vec<ResourceId> = self
            .graph
            .edges_directed(idx, dir)
            .filter(|e| *e.weight() == kind)
            .filter_map(|e| {
                let other = if dir == Direction::Incoming {
                    e.source()
                } else {
                    e.target()
                };
                self.resource_id_at(other)
            })
            .collect();
        out.sort();
        out
    }

    fn process_id_at(&self, idx: NodeIndex) -> Option<ProcessId> {
        self.graph.node_weight(idx)?.as_process().map(|p| p.id)
    }

    fn resource_id_at(&self, idx: NodeIndex) -> Option<ResourceId> {
        self.graph.node_weight(idx)?.as_resource().map(|r| r.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential_and_never_reused() {
        let mut g = AllocationGraph::new();
        let p1 = g.add_process(Personality::Greedy);
        let p2 = g.add_process(Personality::Patient);
        assert_eq!((p1, p2), (ProcessId(1), ProcessId(2)));

        g.remove_process(p2).unwrap();
        let p3 = g.add_process(Personality::Patient);
        assert_eq!(p3, ProcessId(3));
        assert_eq!(g.process_count(), 2);
    }

    #[test]
    fn test_holder_and_waiters() {
        let mut g = AllocationGraph::new();
        let p1 = g.add_process(Personality::Cooperative);
        let p2 = g.add_process(Personality::Cooperative);
        let r1 = g.add_resource();
        let (pi1, pi2, ri1) = (
            g.process_index(p1).unwrap(),
            g.process_index(p2).unwrap(),
            g.resource_index(r1).unwrap(),
        );

        g.insert_assignment(ri1, pi1);
        assert!(g.insert_request(pi2, ri1));
        assert!(!g.insert_request(pi2, ri1));

        assert_eq!(g.holder(r1), Some(p1));
        assert_eq!(g.held_by(p1), vec![r1]);
        assert_eq!(g.waiters(r1), vec![p2]);
        assert_eq!(g.requested_by(p2), vec![r1]);
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn test_remove_process_frees_resources_and_edges() {
        let mut g = AllocationGraph::new();
        let p1 = g.add_process(Personality::Aggressive);
        let p2 = g.add_process(Personality::Patient);
        let r1 = g.add_resource();
        let r2 = g.add_resource();
        let (pi1, pi2) = (g.process_index(p1).unwrap(), g.process_index(p2).unwrap());
        let (ri1, ri2) = (g.resource_index(r1).unwrap(), g.resource_index(r2).unwrap());
        g.insert_assignment(ri1, pi1);
        g.insert_assignment(ri2, pi2);
        g.insert_request(pi1, ri2);

        let (removed, freed) = g.remove_process(p1).unwrap();
        assert_eq!(removed.id, p1);
        assert_eq!(freed, vec![r1]);
        assert_eq!(g.holder(r1), None);
        assert_eq!(g.waiters(r2), Vec::<ProcessId>::new());
        assert_eq!(g.edge_count(), 1);
        assert!(!g.contains_process(p1));
        // Surviving indices remain valid after removal.
        assert_eq!(g.holder(r2), Some(p2));
    }

    #[test]
    fn test_unknown_ids() {
        let mut g = AllocationGraph::new();
        assert_eq!(
            g.process_index(ProcessId(9)),
            Err(EngineError::UnknownEntity(EntityRef::Process(ProcessId(9))))
        );
        assert!(g.remove_process(ProcessId(1)).is_err());
        assert!(g.waiters(ResourceId(1)).is_empty());
    }

    #[test]
    fn test_edges_listing() {
        let mut g = AllocationGraph::new();
        let p1 = g.add_process(Personality::Greedy);
        let r1 = g.add_resource();
        let r2 = g.add_resource();
        let pi = g.process_index(p1).unwrap();
        let (ri1, ri2) = (g.resource_index(r1).unwrap(), g.resource_index(r2).unwrap());
        g.insert_assignment(ri1, pi);
        g.insert_request(pi, ri2);
        assert_eq!(
            g.edges(),
            vec![
                (EdgeKind::Assignment, p1, r1),
                (EdgeKind::Request, p1, r2),
            ]
        );
    }
}
