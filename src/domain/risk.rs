use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Weights of the advisory risk heuristic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RiskWeights {
    pub per_process: u32,
    pub per_resource: u32,
    /// Added when there are more processes than resources
    pub scarcity_penalty: u32,
    /// Scores at or above this are `Elevated`
    pub elevated_threshold: u8,
    /// Scores at or above this are `High`
    pub high_threshold: u8,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            per_process: 15,
            per_resource: 10,
            scarcity_penalty: 20,
            elevated_threshold: 40,
            high_threshold: 70,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Elevated,
    High,
    /// Only while deadlocked
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RiskAssessment {
    pub score: u8,
    pub level: RiskLevel,
}

/// Score in `[0, 100]`. Exactly 100 iff `deadlocked`; otherwise capped at 99.
/// Non-decreasing in `processes` with everything else fixed.
pub fn risk_score(weights: &RiskWeights, processes: usize, resources: usize, deadlocked: bool) -> u8 {
    if deadlocked {
        return 100;
    }
    let mut risk = u64::from(weights.per_process).saturating_mul(processes as u64);
    risk = risk.saturating_add(u64::from(weights.per_resource).saturating_mul(resources as u64));
    if processes > resources {
        risk = risk.saturating_add(u64::from(weights.scarcity_penalty));
    }
    risk.min(99) as u8
}

pub fn assess(weights: &RiskWeights, processes: usize, resources: usize, deadlocked: bool) -> RiskAssessment {
    let score = risk_score(weights, processes, resources, deadlocked);
    let level = if deadlocked {
        RiskLevel::Critical
    } else if score >= weights.high_threshold {
        RiskLevel::High
    } else if score >= weights.elevated_threshold {
        RiskLevel::Elevated
    } else {
        RiskLevel::Low
    };
    RiskAssessment { score, level }
}

/// True when a change moved the level into `High` from anything else.
pub fn entered_high(before: RiskLevel, after: RiskLevel) -> bool {
    after == RiskLevel::High && before != RiskLevel::High
}
