use crate::domain::graph::AllocationGraph;
use crate::domain::node::{Personality, Process, ProcessId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Victim counts per personality, accumulated across resolutions.
/// Policies may read it to bias later choices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResolutionHistory {
    victims: BTreeMap<Personality, u32>,
    total: u32,
}

impl ResolutionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, personality: Personality) {
        *self.victims.entry(personality).or_insert(0) += 1;
        self.total += 1;
    }

    /// Number of prior victims with this personality
    pub fn failures(&self, personality: Personality) -> u32 {
        self.victims.get(&personality).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.total
    }
}

/// Read-only view handed to a policy while it scores candidates
pub struct VictimContext<'a> {
    pub graph: &'a AllocationGraph,
    pub history: &'a ResolutionHistory,
}

impl VictimContext<'_> {
    /// Number of resources the process currently holds
    pub fn held_count(&self, id: ProcessId) -> usize {
        self.graph.held_by(id).len()
    }
}

/// Victim-selection policy (implemented by adapters).
///
/// The highest score among the deadlocked processes is removed. Scoring must
/// be deterministic for a given graph and history.
pub trait VictimPolicy: Send + Sync {
    fn name(&self) -> &str;

    fn score(&self, process: &Process, ctx: &VictimContext<'_>) -> f64;
}

/// Base weights per personality class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PersonalityWeights {
    pub greedy: f64,
    pub aggressive: f64,
    pub patient: f64,
    pub cooperative: f64,
}

impl Default for PersonalityWeights {
    fn default() -> Self {
        Self {
            greedy: 4.0,
            aggressive: 3.0,
            patient: 2.0,
            cooperative: 1.0,
        }
    }
}

impl PersonalityWeights {
    pub fn weight(&self, personality: Personality) -> f64 {
        match personality {
            Personality::Greedy => self.greedy,
            Personality::Aggressive => self.aggressive,
            Personality::Patient => self.patient,
            Personality::Cooperative => self.cooperative,
        }
    }
}

/// Pick the victim among `candidates`: highest score wins, ties go to the
/// lowest id. Returns `None` for an empty candidate list.
pub fn select_victim(
    candidates: &[ProcessId],
    policy: &dyn VictimPolicy,
    ctx: &VictimContext<'_>,
) -> Option<(ProcessId, f64)> {
    let mut best: Option<(ProcessId, f64)> = None;
    for &id in candidates {
        let Some(process) = ctx.graph.process(id) else {
            continue;
        };
        let score = policy.score(process, ctx);
        best = match best {
            Some((best_id, best_score))
                if best_score > score || (best_score == score && best_id < id) =>
            {
                Some((best_id, best_score))
            }
            _ => Some((id, score)),
        };
    }
    best
}
