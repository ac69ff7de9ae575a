use allocation_graph::domain::engine::AllocationGraphEngine;
use allocation_graph::domain::node::{Personality, ProcessId, ResourceId};
use allocation_graph::domain::scenario::{Link, ProcessSpec, Scenario};
use std::io::Write;
use tempfile::NamedTempFile;

pub fn link(process: u32, resource: u32) -> Link {
    Link { process, resource }
}

pub fn processes(personalities: &[Personality]) -> Vec<ProcessSpec> {
    personalities
        .iter()
        .map(|&personality| ProcessSpec { personality })
        .collect()
}

/// `k` processes in a ring: `Pi` holds `Ri` and requests `R(i mod k)+1`.
pub fn ring_scenario(k: u32) -> Scenario {
    Scenario {
        processes: processes(&vec![Personality::Cooperative; k as usize]),
        resources: k as usize,
        assignments: (1..=k).map(|i| link(i, i)).collect(),
        requests: (1..=k).map(|i| link(i, i % k + 1)).collect(),
        ..Scenario::default()
    }
}

/// Same shape as [`ring_scenario`] with the last request missing, so the
/// wait-for graph is a chain.
pub fn chain_scenario(k: u32) -> Scenario {
    let mut s = ring_scenario(k);
    s.requests.pop();
    s
}

/// P1 (greedy) holds R1 and wants R2; P2 (patient) holds R2 and wants R1.
pub fn two_cycle_scenario() -> Scenario {
    Scenario {
        processes: processes(&[Personality::Greedy, Personality::Patient]),
        resources: 2,
        assignments: vec![link(1, 1), link(2, 2)],
        requests: vec![link(1, 2), link(2, 1)],
        ..Scenario::default()
    }
}

/// Three-process ring with cooperative, aggressive and greedy personalities.
pub fn mixed_ring_scenario() -> Scenario {
    Scenario {
        processes: processes(&[
            Personality::Cooperative,
            Personality::Aggressive,
            Personality::Greedy,
        ]),
        ..ring_scenario(3)
    }
}

/// Built by hand through the engine API instead of a scenario.
pub fn manual_ring(k: u32) -> (AllocationGraphEngine, Vec<ProcessId>, Vec<ResourceId>) {
    let mut engine = AllocationGraphEngine::new();
    let ps: Vec<ProcessId> = (0..k)
        .map(|_| engine.add_process(Personality::Cooperative))
        .collect();
    let rs: Vec<ResourceId> = (0..k).map(|_| engine.add_resource()).collect();
    for i in 0..k as usize {
        engine.allocate_resource(rs[i], ps[i]).unwrap();
    }
    for i in 0..k as usize {
        engine
            .request_resource(ps[i], rs[(i + 1) % k as usize])
            .unwrap();
    }
    (engine, ps, rs)
}

pub fn scenario_file(scenario: &Scenario) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", serde_json::to_string_pretty(scenario).unwrap()).unwrap();
    file
}
