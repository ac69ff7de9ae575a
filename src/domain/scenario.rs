//! Declarative description of an allocation graph, loaded from JSON.
//!
//! Process and resource references are 1-based positions in the
//! `processes` list and the `resources` count. They match the ids a fresh
//! engine assigns, so `{"process": 2, "resource": 1}` means `P2`/`R1`.

use crate::domain::config::EngineConfig;
use crate::domain::node::Personality;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scenario {
    #[serde(default)]
    pub config: EngineConfig,
    #[serde(default)]
    pub processes: Vec<ProcessSpec>,
    /// Number of single-instance resources, at most
    /// [`MAX_SCENARIO_RESOURCES`](crate::domain::builder::MAX_SCENARIO_RESOURCES)
    #[serde(default)]
    pub resources: usize,
    /// Resource → process holds, applied first
    #[serde(default)]
    pub assignments: Vec<Link>,
    /// Process → resource waits, applied after assignments
    #[serde(default)]
    pub requests: Vec<Link>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessSpec {
    #[serde(default)]
    pub personality: Personality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Link {
    pub process: u32,
    pub resource: u32,
}
