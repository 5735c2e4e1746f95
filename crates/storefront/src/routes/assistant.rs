//! Assistant routes: tool registry, tool calls, scripted turn, knowledge search.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::routes::cart::cart_for;
use crate::services::assistant::{AskResponse, Tool, ToolExecutor, ToolResult, is_known_tool, tools};
use crate::services::rag::{SearchHit, clamp_top_k};
use crate::state::AppState;

/// Longest message `ask` accepts.
pub const MAX_MESSAGE_LEN: usize = 2000;

/// `GET /api/assistant/tools`
pub async fn list_tools() -> Json<Vec<Tool>> {
    Json(tools())
}

/// `POST /api/assistant/tools/{name}`
///
/// A missing body counts as `{}`.
#[instrument(skip(state, session, user, body))]
pub async fn call_tool(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(name): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<ToolResult>> {
    if !is_known_tool(&name) {
        return Err(AppError::NotFound(format!("unknown tool '{name}'")));
    }
    let input = body.map_or_else(|| json!({}), |Json(value)| value);

    let executor = ToolExecutor::new(
        state.pool(),
        cart_for(&state, &session, user.as_ref()),
        state.tcs(),
        state.knowledge(),
    );
    executor
        .execute(&name, &input)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("unknown tool '{name}'")))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub message: String,
}

/// `POST /api/assistant/ask`
#[instrument(skip_all)]
pub async fn ask(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("message is required".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::BadRequest(format!(
            "message must be at most {MAX_MESSAGE_LEN} characters"
        )));
    }

    let executor = ToolExecutor::new(
        state.pool(),
        cart_for(&state, &session, user.as_ref()),
        state.tcs(),
        state.knowledge(),
    );
    Ok(Json(executor.ask(message).await))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub top_k: Option<usize>,
}

/// `GET /api/assistant/search?q=&top_k=`
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchHit>>> {
    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("q is required".to_string()))?;

    Ok(Json(state.knowledge().search(q, clamp_top_k(query.top_k))))
}
