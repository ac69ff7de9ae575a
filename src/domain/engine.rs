//! The allocation-graph engine: owns the graph, detects deadlock exactly and
//! resolves it by removing policy-selected victims.
//!
//! Every operation is synchronous and atomic: all validation happens before
//! the first mutation, so a failed call leaves the graph as it was. The engine
//! is not internally synchronized; concurrent hosts wrap it in one lock (see
//! [`crate::app::service::EngineService`]).

use crate::domain::config::EngineConfig;
use crate::domain::detector::{DeadlockDetector, DeadlockReport};
use crate::domain::error::{EngineError, EntityRef, Result};
use crate::domain::graph::AllocationGraph;
use crate::domain::node::{Personality, Process, ProcessId, ResourceId};
use crate::domain::policy::{ResolutionHistory, VictimContext, VictimPolicy, select_victim};
use crate::domain::risk::{self, RiskAssessment, RiskLevel};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Detection state of the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GraphState {
    #[default]
    Stable,
    Deadlocked,
}

/// Running counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EngineStats {
    /// Detection passes performed (including automatic refreshes)
    pub detections: u64,
    /// Transitions from `Stable` into `Deadlocked`
    pub deadlocks_found: u64,
    /// Processes removed as victims
    pub victims: u64,
    /// Times the risk level rose into `High`
    pub high_risk_alerts: u64,
}

#[derive(Debug, Default)]
pub struct AllocationGraphEngine {
    graph: AllocationGraph,
    detector: DeadlockDetector,
    config: EngineConfig,
    history: ResolutionHistory,
    report: DeadlockReport,
    state: GraphState,
    stats: EngineStats,
}

impl AllocationGraphEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &AllocationGraph {
        &self.graph
    }

    pub fn state(&self) -> GraphState {
        self.state
    }

    /// Report of the most recent detection pass
    pub fn last_report(&self) -> &DeadlockReport {
        &self.report
    }

    pub fn history(&self) -> &ResolutionHistory {
        &self.history
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn add_process(&mut self, personality: Personality) -> ProcessId {
        let before = self.risk().level;
        let id = self.graph.add_process(personality);
        debug!(process = %id, %personality, "process added");
        self.note_risk_change(before);
        id
    }

    pub fn add_resource(&mut self) -> ResourceId {
        let before = self.risk().level;
        let id = self.graph.add_resource();
        debug!(resource = %id, "resource added");
        self.note_risk_change(before);
        id
    }

    pub fn set_personality(&mut self, id: ProcessId, personality: Personality) -> Result<()> {
        let process = self
            .graph
            .process_mut(id)
            .ok_or(EngineError::UnknownEntity(EntityRef::Process(id)))?;
        process.personality = personality;
        Ok(())
    }

    /// Record that `process` waits for `resource`. Repeating an existing
    /// request is a no-op.
    pub fn request_resource(&mut self, process: ProcessId, resource: ResourceId) -> Result<()> {
        let pi = self.graph.process_index(process)?;
        let ri = self.graph.resource_index(resource)?;
        if self.graph.holder(resource) == Some(process) {
            return Err(EngineError::InvalidRequest {
                message: format!("{process} already holds {resource}"),
            });
        }
        if self.graph.insert_request(pi, ri) {
            debug!(%process, %resource, "request added");
            self.refresh_if_deadlocked();
        }
        Ok(())
    }

    /// Assign a free resource to `process`, converting its pending request
    /// if there is one. Assigning to the current holder is a no-op.
    pub fn allocate_resource(&mut self, resource: ResourceId, process: ProcessId) -> Result<()> {
        let ri = self.graph.resource_index(resource)?;
        let pi = self.graph.process_index(process)?;
        match self.graph.holder(resource) {
            Some(holder) if holder == process => return Ok(()),
            Some(holder) => return Err(EngineError::ResourceBusy { resource, holder }),
            None => {}
        }
        let converted = self.graph.drop_request(pi, ri);
        self.graph.insert_assignment(ri, pi);
        debug!(%resource, %process, converted, "resource allocated");
        self.refresh_if_deadlocked();
        Ok(())
    }

    pub fn release_resource(&mut self, resource: ResourceId) -> Result<()> {
        let ri = self.graph.resource_index(resource)?;
        let holder = self
            .graph
            .drop_assignment(ri)
            .ok_or(EngineError::NotAssigned(resource))?;
        debug!(%resource, %holder, "resource released");
        self.refresh_if_deadlocked();
        Ok(())
    }

    /// Delete a process and all incident edges; resources it held become free.
    pub fn remove_process(&mut self, id: ProcessId) -> Result<Process> {
        let (process, freed) = self.graph.remove_process(id)?;
        debug!(process = %id, freed = freed.len(), "process removed");
        self.refresh_if_deadlocked();
        Ok(process)
    }

    /// Run exact cycle detection over the wait-for graph, update every
    /// process's `in_deadlock` flag and the graph state.
    pub fn detect_deadlock(&mut self) -> DeadlockReport {
        self.run_detection();
        self.report.clone()
    }

    /// Remove the highest-scoring deadlocked process. Requires the current
    /// state to be `Deadlocked`. Detection is re-run afterwards, so the state
    /// stays `Deadlocked` if another cycle survives.
    pub fn resolve_deadlock(&mut self, policy: &dyn VictimPolicy) -> Result<ProcessId> {
        if self.state != GraphState::Deadlocked {
            return Err(EngineError::NoDeadlock);
        }
        let ctx = VictimContext {
            graph: &self.graph,
            history: &self.history,
        };
        let (victim, score) =
            select_victim(&self.report.members, policy, &ctx).ok_or(EngineError::NoDeadlock)?;

        let (process, freed) = self.graph.remove_process(victim)?;
        self.history.record(process.personality);
        self.stats.victims += 1;
        info!(
            victim = %victim,
            personality = %process.personality,
            policy = policy.name(),
            score,
            freed = ?freed,
            "victim terminated"
        );

        self.run_detection();
        Ok(victim)
    }

    /// Detect, then resolve until no cycle remains. Returns the victims in
    /// removal order.
    pub fn resolve_all(&mut self, policy: &dyn VictimPolicy) -> Result<Vec<ProcessId>> {
        self.run_detection();
        let mut victims = Vec::new();
        while self.state == GraphState::Deadlocked {
            victims.push(self.resolve_deadlock(policy)?);
        }
        Ok(victims)
    }

    /// Advisory risk in `[0, 100]`; exactly 100 while deadlocked.
    pub fn risk_score(&self) -> u8 {
        self.risk().score
    }

    pub fn risk(&self) -> RiskAssessment {
        risk::assess(
            &self.config.risk,
            self.graph.process_count(),
            self.graph.resource_count(),
            self.state == GraphState::Deadlocked,
        )
    }

    /// Warn once when a mutation moves the risk level into `High`.
    fn note_risk_change(&mut self, before: RiskLevel) {
        let after = self.risk();
        if risk::entered_high(before, after.level) {
            self.stats.high_risk_alerts += 1;
            warn!(score = after.score, "high risk of deadlock");
        }
    }

    fn refresh_if_deadlocked(&mut self) {
        if self.state == GraphState::Deadlocked {
            self.run_detection();
        }
    }

    fn run_detection(&mut self) {
        let before = self.risk().level;
        let report = self.detector.detect(&self.graph);
        self.stats.detections += 1;

        let ids: Vec<ProcessId> = self.graph.process_ids().collect();
        for id in ids {
            let flagged = report.contains(id);
            if let Some(p) = self.graph.process_mut(id) {
                p.in_deadlock = flagged;
            }
        }

        let next = if report.is_deadlocked() {
            GraphState::Deadlocked
        } else {
            GraphState::Stable
        };
        match (self.state, next) {
            (GraphState::Stable, GraphState::Deadlocked) => {
                self.stats.deadlocks_found += 1;
                info!(
                    members = ?report.members,
                    cycles = report.cycles.len(),
                    "deadlock detected"
                );
            }
            (GraphState::Deadlocked, GraphState::Stable) => info!("deadlock resolved"),
            _ => debug!(members = report.members.len(), "detection pass"),
        }

        self.state = next;
        self.report = report;
        self.note_risk_change(before);
    }
}
