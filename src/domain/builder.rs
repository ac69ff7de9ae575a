use crate::domain::engine::AllocationGraphEngine;
use crate::domain::node::{ProcessId, ResourceId};
use crate::domain::scenario::{Link, Scenario};
use anyhow::{Context as _, Result, anyhow, ensure};

/// Largest resource count a scenario may declare
pub const MAX_SCENARIO_RESOURCES: usize = 1_000_000;

/// Engine builder - Domain Service for turning a scenario into a live engine
#[derive(Debug, Default)]
pub struct EngineBuilder;

impl EngineBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Two-pass build: nodes first, then edges (assignments before requests).
    /// Detection is not run; the engine starts `Stable`.
    pub fn build(&self, scenario: Scenario) -> Result<AllocationGraphEngine> {
        ensure!(
            scenario.resources <= MAX_SCENARIO_RESOURCES,
            "scenario declares {} resources (limit {MAX_SCENARIO_RESOURCES})",
            scenario.resources
        );
        let mut engine = AllocationGraphEngine::with_config(scenario.config);

        // Pass 1: nodes
        let processes: Vec<ProcessId> = scenario
            .processes
            .iter()
            .map(|spec| engine.add_process(spec.personality))
            .collect();
        let resources: Vec<ResourceId> = (0..scenario.resources)
            .map(|_| engine.add_resource())
            .collect();

        // Pass 2: edges
        for (i, link) in scenario.assignments.iter().enumerate() {
            let (p, r) = resolve_link(link, &processes, &resources)
                .with_context(|| format!("assignment #{}", i + 1))?;
            engine
                .allocate_resource(r, p)
                .with_context(|| format!("assignment #{} ({r} -> {p})", i + 1))?;
        }
        for (i, link) in scenario.requests.iter().enumerate() {
            let (p, r) = resolve_link(link, &processes, &resources)
                .with_context(|| format!("request #{}", i + 1))?;
            engine
                .request_resource(p, r)
                .with_context(|| format!("request #{} ({p} -> {r})", i + 1))?;
        }

        Ok(engine)
    }
}

fn resolve_link(
    link: &Link,
    processes: &[ProcessId],
    resources: &[ResourceId],
) -> Result<(ProcessId, ResourceId)> {
    let p = position(processes, link.process)
        .ok_or_else(|| anyhow!("process {} out of range (1..={})", link.process, processes.len()))?;
    let r = position(resources, link.resource).ok_or_else(|| {
        anyhow!(
            "resource {} out of range (1..={})",
            link.resource,
            resources.len()
        )
    })?;
    Ok((p, r))
}

fn position<T: Copy>(items: &[T], one_based: u32) -> Option<T> {
    let idx = usize::try_from(one_based).ok()?.checked_sub(1)?;
    items.get(idx).copied()
}
