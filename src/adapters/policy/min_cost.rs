use crate::domain::node::Process;
use crate::domain::policy::{VictimContext, VictimPolicy};

/// Minimum-cost victim selection: fewer held resources scores higher.
#[derive(Debug, Default)]
pub struct MinCostPolicy;

impl MinCostPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl VictimPolicy for MinCostPolicy {
    fn name(&self) -> &str {
        "min_cost"
    }

    fn score(&self, process: &Process, ctx: &VictimContext<'_>) -> f64 {
        -(ctx.held_count(process.id) as f64)
    }
}
