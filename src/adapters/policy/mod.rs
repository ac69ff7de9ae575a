//! Victim-selection policy adapters

mod min_cost;
mod personality;
mod youngest;

pub use min_cost::MinCostPolicy;
pub use personality::PersonalityPolicy;
pub use youngest::YoungestPolicy;

use crate::domain::config::{EngineConfig, PolicyKind};
use crate::domain::policy::VictimPolicy;

/// Instantiate the policy named by `kind`, tuned by `config`
pub fn policy_for(kind: PolicyKind, config: &EngineConfig) -> Box<dyn VictimPolicy> {
    match kind {
        PolicyKind::Personality => Box::new(PersonalityPolicy::new(
            config.weights.clone(),
            config.learned_bias,
        )),
        PolicyKind::Youngest => Box::new(YoungestPolicy::new()),
        PolicyKind::MinCost => Box::new(MinCostPolicy::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_for_names() {
        let cfg = EngineConfig::default();
        assert_eq!(policy_for(PolicyKind::Personality, &cfg).name(), "personality");
        assert_eq!(policy_for(PolicyKind::Youngest, &cfg).name(), "youngest");
        assert_eq!(policy_for(PolicyKind::MinCost, &cfg).name(), "min_cost");
    }
}
