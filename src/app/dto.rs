use crate::domain::detector::DeadlockReport;
use crate::domain::edge::EdgeKind;
use crate::domain::engine::{EngineStats, GraphState};
use crate::domain::node::{Personality, ProcessId, ResourceId};
use crate::domain::policy::ResolutionHistory;
use crate::domain::risk::RiskAssessment;
use rmcp::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use crate::domain::config::PolicyKind;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    /// Scenario file the engine was loaded from, if any
    pub scenario_path: Option<String>,
    pub state: GraphState,
    pub process_count: usize,
    pub resource_count: usize,
    pub edge_count: usize,
    pub stats: EngineStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GraphSnapshot {
    pub state: GraphState,
    pub processes: Vec<ProcessView>,
    pub resources: Vec<ResourceView>,
    pub edges: Vec<EdgeView>,
    /// Derived wait-for edges
    pub wait_for: Vec<WaitEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProcessView {
    pub id: ProcessId,
    /// Display label, e.g. `P3`
    pub label: String,
    pub personality: Personality,
    pub in_deadlock: bool,
    pub holds: Vec<ResourceId>,
    pub waits_on: Vec<ResourceId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResourceView {
    pub id: ResourceId,
    /// Display label, e.g. `R2`
    pub label: String,
    pub holder: Option<ProcessId>,
    pub waiters: Vec<ProcessId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EdgeView {
    pub kind: EdgeKind,
    pub process: ProcessId,
    pub resource: ResourceId,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WaitEdge {
    pub waiter: ProcessId,
    pub holder: ProcessId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AddProcessRequest {
    #[serde(default)]
    pub personality: Personality,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PersonalityUpdate {
    pub personality: Personality,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetPersonalityRequest {
    pub process: ProcessId,
    pub personality: Personality,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProcessCreated {
    pub id: ProcessId,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResourceCreated {
    pub id: ResourceId,
    pub label: String,
}

/// A process/resource pair, used for both requests and allocations
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LinkRequest {
    pub process: ProcessId,
    pub resource: ResourceId,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReleaseRequest {
    pub resource: ResourceId,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RemoveProcessRequest {
    pub process: ProcessId,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DetectResponse {
    pub state: GraphState,
    pub report: DeadlockReport,
    pub risk: RiskAssessment,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ResolveRequest {
    /// Defaults to the engine's configured policy
    pub policy: Option<PolicyKind>,
    /// Keep resolving until no cycle remains
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResolveResponse {
    pub policy: PolicyKind,
    /// Removed processes, in removal order
    pub victims: Vec<ProcessId>,
    pub state: GraphState,
    /// Detection result after the last removal
    pub report: DeadlockReport,
    pub history: ResolutionHistory,
}

/// Acknowledgement for mutations, carrying the resulting graph state
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Ack {
    pub state: GraphState,
}
