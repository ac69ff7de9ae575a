//! Deadlock detection over the wait-for graph.
//!
//! The wait-for graph is derived from the allocation graph: whenever process
//! `P` requests resource `R` and `R` is assigned to `Q`, there is an edge
//! `P -> Q`. Every process on a cycle of that graph is deadlocked.
//!
//! ```text
//! P1 requests R1 (held by P2):  P1 -> P2
//! P2 requests R2 (held by P3):  P2 -> P3
//! P3 requests R3 (held by P1):  P3 -> P1   (cycle = deadlock)
//! ```
//!
//! Cycles are discovered with a depth-first search that tracks the recursion
//! stack; membership is cross-checked against the strongly connected
//! components so a process that only closes a cycle through a cross edge is
//! still reported. Both walks keep their stacks on the heap, so wait chains
//! of any length are safe.

use crate::domain::graph::AllocationGraph;
use crate::domain::node::{ProcessId, ResourceId};
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

/// Result of a detection pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DeadlockReport {
    /// Every deadlocked process, ascending
    pub members: Vec<ProcessId>,
    /// Distinct cycles, each rotated to start at its smallest id
    pub cycles: Vec<Vec<ProcessId>>,
}

impl DeadlockReport {
    pub fn is_deadlocked(&self) -> bool {
        !self.members.is_empty()
    }

    pub fn contains(&self, id: ProcessId) -> bool {
        self.members.binary_search(&id).is_ok()
    }
}

/// Wait-for graph derived from an allocation graph
#[derive(Debug)]
pub struct WaitForGraph {
    graph: DiGraph<ProcessId, ResourceId>,
    index: BTreeMap<ProcessId, NodeIndex>,
}

impl WaitForGraph {
    pub fn build(alloc: &AllocationGraph) -> Self {
        let mut graph = DiGraph::new();
        let mut index = BTreeMap::new();
        for id in alloc.process_ids() {
            index.insert(id, graph.add_node(id));
        }

        for (&waiter, &from) in &index {
            for resource in alloc.requested_by(waiter) {
                let Some(holder) = alloc.holder(resource) else {
                    continue;
                };
                if let Some(&to) = index.get(&holder) {
                    graph.update_edge(from, to, resource);
                }
            }
        }

        Self { graph, index }
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Processes `id` is waiting on, ascending
    pub fn waits_for(&self, id: ProcessId) -> Vec<ProcessId> {
        match self.index.get(&id) {
            Some(&idx) => self
                .successors(idx)
                .into_iter()
                .map(|n| self.graph[n])
                .collect(),
            None => Vec::new(),
        }
    }

    /// All wait-for edges as `(waiter, holder)`, ascending
    pub fn edges(&self) -> Vec<(ProcessId, ProcessId)> {
        let mut out: Vec<_> = self
            .graph
            .raw_edges()
            .iter()
            .map(|e| (self.graph[e.source()], self.graph[e.target()]))
            .collect();
        out.sort();
        out
    }

    /// Successors ordered by process id, for deterministic traversal
    fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut next: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
        next.sort_by_key(|&n| self.graph[n]);
        next
    }

    fn back_edge_cycles(&self) -> BTreeSet<Vec<ProcessId>> {
        let mut marks = vec![Mark::Unvisited; self.graph.node_count()];
        let mut cycles = BTreeSet::new();
        for &start in self.index.values() {
            if marks[start.index()] == Mark::Unvisited {
                self.dfs(start, &mut marks, &mut cycles);
            }
        }
        cycles
    }

    /// Depth-first walk from `start`. `path` is the recursion stack and
    /// `frames` holds the unexplored successors of each node on it.
    fn dfs(&self, start: NodeIndex, marks: &mut [Mark], cycles: &mut BTreeSet<Vec<ProcessId>>) {
        let mut path = vec![start];
        let mut frames = vec![self.successors(start).into_iter()];
        marks[start.index()] = Mark::OnStack;

        while let Some(frame) = frames.last_mut() {
            let Some(next) = frame.next() else {
                frames.pop();
                if let Some(done) = path.pop() {
                    marks[done.index()] = Mark::Done;
                }
                continue;
            };
            match marks[next.index()] {
                Mark::Unvisited => {
                    marks[next.index()] = Mark::OnStack;
                    path.push(next);
                    frames.push(self.successors(next).into_iter());
                }
                Mark::OnStack => {
                    if let Some(pos) = path.iter().rposition(|&n| n == next) {
                        let cycle = path[pos..].iter().map(|&n| self.graph[n]).collect();
                        cycles.insert(normalize(cycle));
                    }
                }
                Mark::Done => {}
            }
        }
    }

    /// Nodes of every strongly connected component that contains a cycle
    fn cyclic_components(&self) -> Vec<Vec<NodeIndex>> {
        kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .collect()
    }

    /// Shortest cycle through `start` that stays inside `within`
    fn shortest_cycle_through(
        &self,
        start: NodeIndex,
        within: &HashSet<NodeIndex>,
    ) -> Option<Vec<ProcessId>> {
        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for next in self.successors(current) {
                if !within.contains(&next) {
                    continue;
                }
                if next == start {
                    let mut path = vec![self.graph[current]];
                    let mut at = current;
                    while at != start {
                        match parent.get(&at) {
                            Some(&p) => at = p,
                            None => break,
                        }
                        path.push(self.graph[at]);
                    }
                    path.reverse();
                    return Some(normalize(path));
                }
                if parent.contains_key(&next) {
                    continue;
                }
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

fn normalize(mut cycle: Vec<ProcessId>) -> Vec<ProcessId> {
    if let Some(pos) = cycle
        .iter()
        .enumerate()
        .min_by_key(|&(_, id)| *id)
        .map(|(i, _)| i)
    {
        cycle.rotate_left(pos);
    }
    cycle
}

/// Exact deadlock detector
#[derive(Debug, Default, Clone, Copy)]
pub struct DeadlockDetector;

impl DeadlockDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, graph: &AllocationGraph) -> DeadlockReport {
        self.detect_in(&WaitForGraph::build(graph))
    }

    pub fn detect_in(&self, wfg: &WaitForGraph) -> DeadlockReport {
        let mut cycles = wfg.back_edge_cycles();
        let mut covered: HashSet<ProcessId> = cycles.iter().flatten().copied().collect();
        let mut members = BTreeSet::new();

        for component in wfg.cyclic_components() {
            let within: HashSet<NodeIndex> = component.iter().copied().collect();
            let mut ordered = component;
            ordered.sort_by_key(|&n| wfg.graph[n]);

            for node in ordered {
                let id = wfg.graph[node];
                members.insert(id);
                if covered.contains(&id) {
                    continue;
                }
                if let Some(cycle) = wfg.shortest_cycle_through(node, &within) {
                    covered.extend(cycle.iter().copied());
                    cycles.insert(cycle);
                }
            }
        }

        DeadlockReport {
            members: members.into_iter().collect(),
            cycles: cycles.into_iter().collect(),
        }
    }
}
