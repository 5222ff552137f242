//! HTTP server implementation using Axum.

use crate::engine::{ExecutionResult, PreviewDescriptor};
use crate::error::RunnerError;
use crate::routes::RouteMatch;
use crate::session::{SessionKind, SessionSummary};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

// Request/Response types
#[derive(Deserialize)]
struct CreateSessionRequest {
    lab_id: String,
    user_id: String,
    kind: SessionKind,
}

#[derive(Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

#[derive(Deserialize)]
struct ExecuteRequest {
    code: String,
    language: String,
}

#[derive(Deserialize)]
struct PreviewRequest {
    code: String,
    kind: SessionKind,
}

#[derive(Deserialize)]
struct DeployRequest {
    #[serde(default)]
    frontend: String,
    server_code: Option<String>,
}

#[derive(Deserialize)]
struct ResolveQuery {
    #[serde(default)]
    token: String,
}

impl IntoResponse for RunnerError {
    fn into_response(self) -> Response {
        let status = match &self {
            RunnerError::SessionExpiredOrNotFound(_) => StatusCode::NOT_FOUND,
            RunnerError::Validation(_) => StatusCode::BAD_REQUEST,
            RunnerError::Provider { .. } => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<JsonRejection> for RunnerError {
    fn from(rejection: JsonRejection) -> Self {
        RunnerError::validation(rejection.body_text())
    }
}

/// Build the router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Session management
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(stop_session))
        .route("/users/:user_id/sessions", get(user_sessions))
        // Execution
        .route("/sessions/:id/execute", post(execute))
        .route("/sessions/:id/preview", post(preview))
        .route("/sessions/:id/deploy", post(deploy))
        // View tokens
        .route("/routes/resolve", get(resolve_route))
        // Health check
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP server on the given port with the provided state.
pub async fn run_server(port: u16, state: AppState) -> std::io::Result<()> {
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> &'static str {
    "OK"
}

async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), RunnerError> {
    let Json(req) = payload?;
    let session_id = state
        .engine
        .create_session(&req.lab_id, &req.user_id, req.kind)
        .await?;
    Ok((StatusCode::CREATED, Json(CreateSessionResponse { session_id })))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSummary>, RunnerError> {
    Ok(Json(state.engine.session(&id).await?))
}

async fn stop_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.engine.stop_session(&id).await;
    StatusCode::NO_CONTENT
}

async fn user_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Vec<SessionSummary>> {
    Json(state.engine.user_sessions(&user_id).await)
}

async fn execute(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ExecuteRequest>, JsonRejection>,
) -> Result<Json<ExecutionResult>, RunnerError> {
    let Json(req) = payload?;
    let result = state
        .engine
        .execute_interpreted(&id, &req.code, &req.language)
        .await?;
    info!(session_id = %id, exit_code = result.exit_code, "POST /execute finished");
    Ok(Json(result))
}

async fn preview(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<Json<PreviewDescriptor>, RunnerError> {
    let Json(req) = payload?;
    Ok(Json(
        state
            .engine
            .execute_sandboxed(&id, &req.code, req.kind)
            .await?,
    ))
}

async fn deploy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<DeployRequest>, JsonRejection>,
) -> Result<Json<PreviewDescriptor>, RunnerError> {
    let Json(req) = payload?;
    Ok(Json(
        state
            .engine
            .deploy_web(&id, &req.frontend, req.server_code.as_deref())
            .await?,
    ))
}

async fn resolve_route(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Json<RouteMatch> {
    Json(state.views.resolve(&query.token))
}
