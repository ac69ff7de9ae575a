use crate::adapters::fs::reader::JsonScenarioFile;
use crate::adapters::policy::policy_for;
use crate::app::dto::*;
use crate::domain::builder::EngineBuilder;
use crate::domain::detector::WaitForGraph;
use crate::domain::engine::AllocationGraphEngine;
use crate::domain::node::{Personality, ProcessId};
use crate::domain::ports::ScenarioSource;
use crate::domain::scenario::Scenario;
use anyhow::{Context as _, Result, anyhow};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Shared handle to one engine. Every call takes the single lock for its
/// whole duration, so each operation is atomic with respect to other callers.
#[derive(Clone)]
pub struct EngineService {
    inner: Arc<Mutex<ServiceData>>,
}

struct ServiceData {
    scenario_path: Option<PathBuf>,
    engine: AllocationGraphEngine,
}

impl Default for EngineService {
    fn default() -> Self {
        Self::from_engine(AllocationGraphEngine::new())
    }
}

impl EngineService {
    pub fn from_engine(engine: AllocationGraphEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ServiceData {
                scenario_path: None,
                engine,
            })),
        }
    }

    pub fn from_scenario(scenario: Scenario) -> Result<Self> {
        let engine = EngineBuilder::new()
            .build(scenario)
            .context("Failed to build engine from scenario")?;
        Ok(Self::from_engine(engine))
    }

    pub fn load_from_json(path: &Path) -> Result<Self> {
        let engine = build_from_file(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(ServiceData {
                scenario_path: Some(path.to_path_buf()),
                engine,
            })),
        })
    }

    /// Rebuild the engine from its scenario file, discarding live state
    pub fn reload(&self) -> Result<HealthResponse> {
        let path = self
            .lock()?
            .scenario_path
            .clone()
            .ok_or_else(|| anyhow!("Engine was not loaded from a scenario file"))?;
        let engine = build_from_file(&path)?;

        let mut data = self.lock()?;
        data.engine = engine;
        info!(path = %path.display(), "scenario reloaded");
        Ok(health_locked(&data))
    }

    pub fn health(&self) -> Result<HealthResponse> {
        let data = self.lock()?;
        Ok(health_locked(&data))
    }

    pub fn snapshot(&self) -> Result<GraphSnapshot> {
        let data = self.lock()?;
        let engine = &data.engine;
        let graph = engine.graph();

        let processes = graph
            .processes()
            .map(|p| ProcessView {
                id: p.id,
                label: p.id.to_string(),
                personality: p.personality,
                in_deadlock: p.in_deadlock,
                holds: graph.held_by(p.id),
                waits_on: graph.requested_by(p.id),
            })
            .collect();

        let resources = graph
            .resource_ids()
            .map(|r| ResourceView {
                id: r,
                label: r.to_string(),
                holder: graph.holder(r),
                waiters: graph.waiters(r),
            })
            .collect();

        let edges = graph
            .edges()
            .into_iter()
            .map(|(kind, process, resource)| EdgeView {
                kind,
                process,
                resource,
            })
            .collect();

        let wait_for = WaitForGraph::build(graph)
            .edges()
            .into_iter()
            .map(|(waiter, holder)| WaitEdge { waiter, holder })
            .collect();

        Ok(GraphSnapshot {
            state: engine.state(),
            processes,
            resources,
            edges,
            wait_for,
        })
    }

    pub fn add_process(&self, req: AddProcessRequest) -> Result<ProcessCreated> {
        let id = self.lock()?.engine.add_process(req.personality);
        Ok(ProcessCreated {
            id,
            label: id.to_string(),
        })
    }

    pub fn set_personality(&self, id: ProcessId, personality: Personality) -> Result<Ack> {
        let mut data = self.lock()?;
        data.engine.set_personality(id, personality)?;
        Ok(Ack {
            state: data.engine.state(),
        })
    }

    pub fn add_resource(&self) -> Result<ResourceCreated> {
        let id = self.lock()?.engine.add_resource();
        Ok(ResourceCreated {
            id,
            label: id.to_string(),
        })
    }

    pub fn request(&self, req: LinkRequest) -> Result<Ack> {
        let mut data = self.lock()?;
        data.engine.request_resource(req.process, req.resource)?;
        Ok(Ack {
            state: data.engine.state(),
        })
    }

    pub fn allocate(&self, req: LinkRequest) -> Result<Ack> {
        let mut data = self.lock()?;
        data.engine.allocate_resource(req.resource, req.process)?;
        Ok(Ack {
            state: data.engine.state(),
        })
    }

    pub fn release(&self, req: ReleaseRequest) -> Result<Ack> {
        let mut data = self.lock()?;
        data.engine.release_resource(req.resource)?;
        Ok(Ack {
            state: data.engine.state(),
        })
    }

    pub fn remove_process(&self, id: ProcessId) -> Result<Ack> {
        let mut data = self.lock()?;
        data.engine.remove_process(id)?;
        Ok(Ack {
            state: data.engine.state(),
        })
    }

    pub fn detect(&self) -> Result<DetectResponse> {
        let mut data = self.lock()?;
        let report = data.engine.detect_deadlock();
        Ok(DetectResponse {
            state: data.engine.state(),
            report,
            risk: data.engine.risk(),
        })
    }

    pub fn resolve(&self, req: ResolveRequest) -> Result<ResolveResponse> {
        let mut data = self.lock()?;
        let kind = req.policy.unwrap_or(data.engine.config().policy);
        let policy = policy_for(kind, data.engine.config());

        let victims = if req.all {
            data.engine.resolve_all(policy.as_ref())?
        } else {
            vec![data.engine.resolve_deadlock(policy.as_ref())?]
        };

        Ok(ResolveResponse {
            policy: kind,
            victims,
            state: data.engine.state(),
            report: data.engine.last_report().clone(),
            history: data.engine.history().clone(),
        })
    }

    pub fn risk(&self) -> Result<crate::domain::risk::RiskAssessment> {
        Ok(self.lock()?.engine.risk())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ServiceData>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("engine lock poisoned"))
    }
}

fn build_from_file(path: &Path) -> Result<AllocationGraphEngine> {
    let scenario = JsonScenarioFile::new(path).load()?;
    EngineBuilder::new()
        .build(scenario)
        .with_context(|| format!("Failed to build engine from {}", path.display()))
}

fn health_locked(data: &ServiceData) -> HealthResponse {
    let graph = data.engine.graph();
    HealthResponse {
        scenario_path: data
            .scenario_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string()),
        state: data.engine.state(),
        process_count: graph.process_count(),
        resource_count: graph.resource_count(),
        edge_count: graph.edge_count(),
        stats: data.engine.stats(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::engine::GraphState;
    use crate::domain::error::EngineError;
    use crate::domain::node::ResourceId;

    fn two_cycle_service() -> EngineService {
        let svc = EngineService::default();
        let p1 = svc
            .add_process(AddProcessRequest {
                personality: Personality::Greedy,
            })
            .unwrap()
            .id;
        let p2 = svc.add_process(AddProcessRequest::default()).unwrap().id;
        let r1 = svc.add_resource().unwrap().id;
        let r2 = svc.add_resource().unwrap().id;
        for (process, resource) in [(p1, r1), (p2, r2)] {
            svc.allocate(LinkRequest { process, resource }).unwrap();
        }
        for (process, resource) in [(p1, r2), (p2, r1)] {
            svc.request(LinkRequest { process, resource }).unwrap();
        }
        svc
    }

    #[test]
    fn test_health_counts() {
        let svc = two_cycle_service();
        let health = svc.health().unwrap();
        assert_eq!(health.process_count, 2);
        assert_eq!(health.resource_count, 2);
        assert_eq!(health.edge_count, 4);
        assert_eq!(health.state, GraphState::Stable);
        assert!(health.scenario_path.is_none());
    }

    #[test]
    fn test_snapshot_shape() {
        let svc = two_cycle_service();
        let snap = svc.snapshot().unwrap();
        assert_eq!(snap.processes.len(), 2);
        assert_eq!(snap.processes[0].label, "P1");
        assert_eq!(snap.processes[0].holds, vec![ResourceId(1)]);
        assert_eq!(snap.processes[0].waits_on, vec![ResourceId(2)]);
        assert_eq!(snap.resources[1].holder, Some(ProcessId(2)));
        assert_eq!(snap.edges.len(), 4);
        assert_eq!(snap.wait_for.len(), 2);
    }

    #[test]
    fn test_detect_then_resolve_with_default_policy() {
        let svc = two_cycle_service();
        let detected = svc.detect().unwrap();
        assert_eq!(detected.state, GraphState::Deadlocked);
        assert_eq!(detected.risk.score, 100);

        let resolved = svc.resolve(ResolveRequest::default()).unwrap();
        // Greedy outweighs Cooperative under the personality policy.
        assert_eq!(resolved.victims, vec![ProcessId(1)]);
        assert_eq!(resolved.policy, PolicyKind::Personality);
        assert_eq!(resolved.state, GraphState::Stable);
        assert_eq!(resolved.history.failures(Personality::Greedy), 1);
    }

    #[test]
    fn test_engine_errors_survive_anyhow() {
        let svc = EngineService::default();
        let err = svc.resolve(ResolveRequest::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EngineError>(),
            Some(&EngineError::NoDeadlock)
        );
    }

    #[test]
    fn test_set_personality_changes_victim() {
        let svc = two_cycle_service();
        svc.set_personality(ProcessId(2), Personality::Greedy).unwrap();
        svc.set_personality(ProcessId(1), Personality::Patient).unwrap();
        svc.detect().unwrap();
        let resolved = svc.resolve(ResolveRequest::default()).unwrap();
        assert_eq!(resolved.victims, vec![ProcessId(2)]);

        let err = svc
            .set_personality(ProcessId(9), Personality::Greedy)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_reload_requires_file() {
        let svc = EngineService::default();
        assert!(svc.reload().is_err());
    }

    #[test]
    fn test_load_and_reload_from_json() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"processes": [{{}}, {{}}], "resources": 2,
                "assignments": [{{"process": 1, "resource": 1}}, {{"process": 2, "resource": 2}}],
                "requests": [{{"process": 1, "resource": 2}}, {{"process": 2, "resource": 1}}]}}"#
        )
        .unwrap();

        let svc = EngineService::load_from_json(file.path()).unwrap();
        svc.detect().unwrap();
        svc.resolve(ResolveRequest {
            policy: Some(PolicyKind::Youngest),
            all: true,
        })
        .unwrap();
        assert_eq!(svc.health().unwrap().process_count, 1);

        let health = svc.reload().unwrap();
        assert_eq!(health.process_count, 2);
        assert_eq!(health.state, GraphState::Stable);
        assert!(health.scenario_path.is_some());
    }
}
