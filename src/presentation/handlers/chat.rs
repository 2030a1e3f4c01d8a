use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::application::ports::{LlmClient, PolicyStore};
use crate::domain::ThreadId;
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub context_used: bool,
    pub tool_calls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteThreadResponse {
    pub status: &'static str,
    pub thread_id: String,
}

#[tracing::instrument(skip(state, request), fields(thread_id = ?request.thread_id))]
pub async fn chat_handler<L, S>(
    State(state): State<AppState<L, S>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError>
where
    L: LlmClient + 'static,
    S: PolicyStore + 'static,
{
    if request.message.is_empty() {
        tracing::warn!("Chat request with empty message");
        return Err(ApiError::validation(
            "message: ensure this value has at least 1 character",
        ));
    }

    let thread_id = match request.thread_id {
        Some(id) => ThreadId::parse(id)
            .map_err(|e| ApiError::validation(format!("thread_id: {}", e)))?,
        None => ThreadId::default(),
    };

    tracing::debug!(message = %sanitize_prompt(&request.message), "Processing chat request");

    let reply = state.chat_agent.chat(&request.message, &thread_id).await?;

    Ok(Json(ChatResponse {
        reply: reply.content,
        context_used: reply.context_used,
        tool_calls: reply.tool_calls,
    }))
}

#[tracing::instrument(skip(state))]
pub async fn delete_thread_handler<L, S>(
    State(state): State<AppState<L, S>>,
    Path(thread_id): Path<String>,
) -> Result<Json<DeleteThreadResponse>, ApiError>
where
    L: LlmClient + 'static,
    S: PolicyStore + 'static,
{
    let thread = ThreadId::parse(thread_id.clone()).map_err(ApiError::validation)?;
    state.chat_agent.delete_thread(&thread).await?;

    Ok(Json(DeleteThreadResponse {
        status: "deleted",
        thread_id,
    }))
}
