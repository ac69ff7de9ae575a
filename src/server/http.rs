use crate::app::dto::*;
use crate::app::service::EngineService;
use crate::domain::error::EngineError;
use crate::domain::node::ProcessId;
use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[derive(Clone)]
pub struct HttpState {
    pub service: EngineService,
}

#[derive(Debug, Clone, Serialize)]
struct ApiErrorBody {
    error: String,
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> impl IntoResponse {
    (status, Json(ApiErrorBody { error: msg.into() }))
}

/// Engine errors map to 4xx; anything else is a 500.
fn status_for(err: &anyhow::Error) -> StatusCode {
    match err.downcast_ref::<EngineError>() {
        Some(EngineError::UnknownEntity(_)) => StatusCode::NOT_FOUND,
        Some(EngineError::InvalidRequest { .. }) => StatusCode::BAD_REQUEST,
        Some(
            EngineError::ResourceBusy { .. } | EngineError::NotAssigned(_) | EngineError::NoDeadlock,
        ) => StatusCode::CONFLICT,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(res) => Json(res).into_response(),
        Err(e) => api_error(status_for(&e), e.to_string()).into_response(),
    }
}

pub fn build_router(service: EngineService) -> Router {
    let state = Arc::new(HttpState { service });

    Router::new()
        .route("/health", get(health))
        .route("/graph", get(graph))
        .route("/risk", get(risk))
        .route("/processes", post(add_process))
        .route("/processes/{id}", delete(remove_process))
        .route("/processes/{id}/personality", put(set_personality))
        .route("/resources", post(add_resource))
        .route("/requests", post(request))
        .route("/allocations", post(allocate))
        .route("/releases", post(release))
        .route("/detect", post(detect))
        .route("/resolve", post(resolve))
        .route("/reload", post(reload))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(service: EngineService, addr: SocketAddr) -> Result<()> {
    let app = build_router(service);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP API listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(State(state): State<Arc<HttpState>>) -> Response {
    respond(state.service.health())
}

async fn graph(State(state): State<Arc<HttpState>>) -> Response {
    respond(state.service.snapshot())
}

async fn risk(State(state): State<Arc<HttpState>>) -> Response {
    respond(state.service.risk())
}

async fn add_process(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<AddProcessRequest>,
) -> Response {
    respond(state.service.add_process(req))
}

async fn remove_process(State(state): State<Arc<HttpState>>, Path(id): Path<u32>) -> Response {
    respond(state.service.remove_process(ProcessId(id)))
}

async fn set_personality(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<u32>,
    Json(req): Json<PersonalityUpdate>,
) -> Response {
    respond(state.service.set_personality(ProcessId(id), req.personality))
}

async fn add_resource(State(state): State<Arc<HttpState>>) -> Response {
    respond(state.service.add_resource())
}

async fn request(State(state): State<Arc<HttpState>>, Json(req): Json<LinkRequest>) -> Response {
    respond(state.service.request(req))
}

async fn allocate(State(state): State<Arc<HttpState>>, Json(req): Json<LinkRequest>) -> Response {
    respond(state.service.allocate(req))
}

async fn release(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<ReleaseRequest>,
) -> Response {
    respond(state.service.release(req))
}

async fn detect(State(state): State<Arc<HttpState>>) -> Response {
    respond(state.service.detect())
}

async fn resolve(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<ResolveRequest>,
) -> Response {
    respond(state.service.resolve(req))
}

async fn reload(State(state): State<Arc<HttpState>>) -> Response {
    respond(state.service.reload())
}
