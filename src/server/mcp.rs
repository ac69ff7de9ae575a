use crate::app::dto::*;
use crate::app::service::EngineService;
use crate::domain::risk::RiskAssessment;
use rmcp::{
    Json, ServerHandler, ServiceExt, handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters, model::*, tool, tool_handler, tool_router,
    transport::stdio,
};

#[derive(Clone)]
pub struct AllocationMcpServer {
    service: EngineService,
    tool_router: ToolRouter<Self>,
}

impl AllocationMcpServer {
    pub fn new(service: EngineService) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }

    pub async fn serve_stdio(self) -> anyhow::Result<()> {
        let service = self.serve(stdio()).await?;
        service.waiting().await?;
        Ok(())
    }
}

fn to_tool<T>(result: anyhow::Result<T>) -> Result<Json<T>, String> {
    result.map(Json).map_err(|e| e.to_string())
}

#[tool_router]
impl AllocationMcpServer {
    #[tool(description = "Engine state, graph size and detection counters.")]
    async fn health(&self) -> Result<Json<HealthResponse>, String> {
        to_tool(self.service.health())
    }

    #[tool(description = "Full resource-allocation graph: processes, resources, edges and derived wait-for edges.")]
    async fn graph_snapshot(&self) -> Result<Json<GraphSnapshot>, String> {
        to_tool(self.service.snapshot())
    }

    #[tool(description = "Create a process with the given personality (cooperative, aggressive, greedy, patient).")]
    async fn add_process(
        &self,
        params: Parameters<AddProcessRequest>,
    ) -> Result<Json<ProcessCreated>, String> {
        to_tool(self.service.add_process(params.0))
    }

    #[tool(description = "Change the personality of an existing process.")]
    async fn set_personality(
        &self,
        params: Parameters<SetPersonalityRequest>,
    ) -> Result<Json<Ack>, String> {
        let req = params.0;
        to_tool(self.service.set_personality(req.process, req.personality))
    }

    #[tool(description = "Create a free single-instance resource.")]
    async fn add_resource(&self) -> Result<Json<ResourceCreated>, String> {
        to_tool(self.service.add_resource())
    }

    #[tool(description = "Record that a process is waiting for a resource.")]
    async fn request_resource(&self, params: Parameters<LinkRequest>) -> Result<Json<Ack>, String> {
        to_tool(self.service.request(params.0))
    }

    #[tool(description = "Assign a free resource to a process.")]
    async fn allocate_resource(
        &self,
        params: Parameters<LinkRequest>,
    ) -> Result<Json<Ack>, String> {
        to_tool(self.service.allocate(params.0))
    }

    #[tool(description = "Release an assigned resource.")]
    async fn release_resource(
        &self,
        params: Parameters<ReleaseRequest>,
    ) -> Result<Json<Ack>, String> {
        to_tool(self.service.release(params.0))
    }

    #[tool(description = "Remove a process and free everything it holds.")]
    async fn remove_process(
        &self,
        params: Parameters<RemoveProcessRequest>,
    ) -> Result<Json<Ack>, String> {
        to_tool(self.service.remove_process(params.0.process))
    }

    #[tool(description = "Run exact cycle detection over the wait-for graph.")]
    async fn detect_deadlock(&self) -> Result<Json<DetectResponse>, String> {
        to_tool(self.service.detect())
    }

    #[tool(
        description = "Terminate the highest-scoring deadlocked process (or all needed victims with all=true)."
    )]
    async fn resolve_deadlock(
        &self,
        params: Parameters<ResolveRequest>,
    ) -> Result<Json<ResolveResponse>, String> {
        to_tool(self.service.resolve(params.0))
    }

    #[tool(description = "Advisory deadlock risk score in [0, 100].")]
    async fn risk_score(&self) -> Result<Json<RiskAssessment>, String> {
        to_tool(self.service.risk())
    }
}

#[tool_handler]
impl ServerHandler for AllocationMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Model processes and resources, detect deadlock exactly and resolve it by terminating a victim."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::engine::GraphState;
    use crate::domain::node::{Personality, ProcessId, ResourceId};

    #[tokio::test]
    async fn test_mcp_tools_smoke() {
        let server = AllocationMcpServer::new(EngineService::default());

        for personality in [Personality::Greedy, Personality::Cooperative] {
            server
                .add_process(Parameters(AddProcessRequest { personality }))
                .await
                .unwrap();
        }
        server.add_resource().await.unwrap();
        server.add_resource().await.unwrap();

        for (p, r) in [(1, 1), (2, 2)] {
            server
                .allocate_resource(Parameters(LinkRequest {
                    process: ProcessId(p),
                    resource: ResourceId(r),
                }))
                .await
                .unwrap();
        }
        for (p, r) in [(1, 2), (2, 1)] {
            server
                .request_resource(Parameters(LinkRequest {
                    process: ProcessId(p),
                    resource: ResourceId(r),
                }))
                .await
                .unwrap();
        }

        server
            .set_personality(Parameters(SetPersonalityRequest {
                process: ProcessId(2),
                personality: Personality::Patient,
            }))
            .await
            .unwrap();

        let detected = server.detect_deadlock().await.unwrap().0;
        assert_eq!(detected.state, GraphState::Deadlocked);

        let resolved = server
            .resolve_deadlock(Parameters(ResolveRequest::default()))
            .await
            .unwrap()
            .0;
        assert_eq!(resolved.victims, vec![ProcessId(1)]);

        let risk = server.risk_score().await.unwrap().0;
        assert!(risk.score < 100);

        let snapshot = server.graph_snapshot().await.unwrap().0;
        assert_eq!(snapshot.processes.len(), 1);

        let err = server
            .release_resource(Parameters(ReleaseRequest {
                resource: ResourceId(1),
            }))
            .await
            .err()
            .expect("release of a free resource must fail");
        assert!(err.contains("not assigned"));

        let health = server.health().await.unwrap().0;
        assert_eq!(health.stats.victims, 1);
    }
}
