use crate::domain::node::Process;
use crate::domain::policy::{PersonalityWeights, VictimContext, VictimPolicy};

/// Personality-weighted victim selection.
/// Score = class weight + `learned_bias` × prior victims of the same class.
pub struct PersonalityPolicy {
    weights: PersonalityWeights,
    learned_bias: f64,
}

impl Default for PersonalityPolicy {
    fn default() -> Self {
        Self::new(PersonalityWeights::default(), 0.5)
    }
}

impl PersonalityPolicy {
    pub fn new(weights: PersonalityWeights, learned_bias: f64) -> Self {
        Self {
            weights,
            learned_bias,
        }
    }

    pub fn learned_bias(&self) -> f64 {
        self.learned_bias
    }
}

impl VictimPolicy for PersonalityPolicy {
    fn name(&self) -> &str {
        "personality"
    }

    fn score(&self, process: &Process, ctx: &VictimContext<'_>) -> f64 {
        let base = self.weights.weight(process.personality);
        let failures = f64::from(ctx.history.failures(process.personality));
        base + self.learned_bias * failures
    }
}
