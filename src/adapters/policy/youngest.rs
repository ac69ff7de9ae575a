use crate::domain::node::Process;
use crate::domain::policy::{VictimContext, VictimPolicy};

/// Youngest-process victim selection: the newest process scores highest.
#[derive(Debug, Default)]
pub struct YoungestPolicy;

impl YoungestPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl VictimPolicy for YoungestPolicy {
    fn name(&self) -> &str {
        "youngest"
    }

    fn score(&self, process: &Process, _ctx: &VictimContext<'_>) -> f64 {
        f64::from(process.id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::AllocationGraph;
    use crate::domain::node::Personality;
    use crate::domain::policy::{ResolutionHistory, select_victim};

    #[test]
    fn test_newest_process_wins() {
        let mut graph = AllocationGraph::new();
        let old = graph.add_process(Personality::Greedy);
        let young = graph.add_process(Personality::Cooperative);
        let history = ResolutionHistory::new();
        let ctx = VictimContext {
            graph: &graph,
            history: &history,
        };
        let pick = select_victim(&[old, young], &YoungestPolicy::new(), &ctx).map(|(id, _)| id);
        assert_eq!(pick, Some(young));
    }
}
