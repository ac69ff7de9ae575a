use crate::domain::policy::PersonalityWeights;
use crate::domain::risk::RiskWeights;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Built-in victim-selection strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Personality class weight plus learned bias
    #[default]
    Personality,
    /// Newest process first
    Youngest,
    /// Process holding the fewest resources first
    MinCost,
}

/// Engine tuning. Every field has a default; a scenario file may override
/// any subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    pub policy: PolicyKind,
    pub weights: PersonalityWeights,
    /// Score added per prior victim of the same personality
    pub learned_bias: f64,
    pub risk: RiskWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            weights: PersonalityWeights::default(),
            learned_bias: 0.5,
            risk: RiskWeights::default(),
        }
    }
}
