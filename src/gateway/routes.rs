use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::StreamExt;
use futures::stream;
use serde::{Deserialize, Serialize};

use crate::runtime::AgentRuntime;

use super::error::{ApiError, ApiResponse};
use super::sse::project;

pub type GatewayState = Arc<AgentRuntime>;

// ─── Request / response bodies ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub timestamp: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ShellViewRequest {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct FileViewRequest {
    pub file: String,
}

#[derive(Debug, Serialize)]
pub struct AgentResponse {
    pub agent_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConsoleRecord {
    pub ps1: String,
    pub command: String,
    pub output: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShellViewResponse {
    pub output: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console: Option<Vec<ConsoleRecord>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileViewResponse {
    pub content: String,
    pub file: String,
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// Agent creation handler at `POST /api/v1/agents`.
pub async fn create_agent(
    State(runtime): State<GatewayState>,
) -> Result<Json<ApiResponse<AgentResponse>>, ApiError> {
    let agent = runtime.create_agent().await?;
    Ok(Json(ApiResponse::success(AgentResponse {
        agent_id: agent.id,
        status: "created".to_owned(),
        message: "Agent created successfully".to_owned(),
    })))
}

/// Chat handler at `POST /api/v1/agents/{id}/chat`: submits a message and
/// streams SSE until `done`.
pub async fn chat(
    State(runtime): State<GatewayState>,
    Path(agent_id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let events = runtime
        .chat(&agent_id, request.message, request.timestamp)
        .await;
    let wire = events.flat_map(|event| {
        stream::iter(project(&event).into_iter().map(|frame| {
            Ok::<Event, Infallible>(
                Event::default()
                    .event(frame.event)
                    .data(frame.data.to_string()),
            )
        }))
    });
    Sse::new(wire).keep_alive(KeepAlive::default())
}

/// Shell view handler at `POST /api/v1/agents/{id}/shell`.
pub async fn view_shell(
    State(runtime): State<GatewayState>,
    Path(agent_id): Path<String>,
    Json(request): Json<ShellViewRequest>,
) -> Result<Json<ApiResponse<ShellViewResponse>>, ApiError> {
    let sandbox = runtime
        .sandbox(&agent_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Agent not found: {agent_id}")))?;
    let result = sandbox
        .view_shell(&request.session_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let data = result
        .data
        .ok_or_else(|| ApiError::Internal("shell view returned no data".to_owned()))?;
    let view: ShellViewResponse = serde_json::from_value(data)
        .map_err(|e| ApiError::Internal(format!("malformed shell view: {e}")))?;
    Ok(Json(ApiResponse::success(view)))
}

/// File view handler at `POST /api/v1/agents/{id}/file`.
pub async fn view_file(
    State(runtime): State<GatewayState>,
    Path(agent_id): Path<String>,
    Json(request): Json<FileViewRequest>,
) -> Result<Json<ApiResponse<FileViewResponse>>, ApiError> {
    let sandbox = runtime
        .sandbox(&agent_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Agent not found: {agent_id}")))?;
    let result = sandbox
        .file_read(&request.file, None, None, false)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let data = result
        .data
        .ok_or_else(|| ApiError::Internal("file read returned no data".to_owned()))?;
    let view: FileViewResponse = serde_json::from_value(data)
        .map_err(|e| ApiError::Internal(format!("malformed file view: {e}")))?;
    Ok(Json(ApiResponse::success(view)))
}
