use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ApiError;
use crate::application::ports::{LlmClient, PolicyStore};
use crate::domain::{Chat, ChatId, Message, MessageId, MessageMetadata, MessageRole};
use crate::presentation::state::AppState;

#[derive(Debug, Serialize)]
pub struct ChatDto {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<MessageDto>,
}

#[derive(Debug, Serialize)]
pub struct MessageDto {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub metadata: Option<MessageMetadata>,
    pub created_at: DateTime<Utc>,
}

impl From<Chat> for ChatDto {
    fn from(chat: Chat) -> Self {
        Self {
            id: chat.id.to_string(),
            title: chat.title,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
            messages: chat.messages.into_iter().map(MessageDto::from).collect(),
        }
    }
}

impl From<Message> for MessageDto {
    fn from(message: Message) -> Self {
        Self {
            id: message.id.to_string(),
            role: message.role,
            content: message.content,
            metadata: message.metadata,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TitleRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveMessageRequest {
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
}

#[tracing::instrument(skip(state))]
pub async fn list_chats_handler<L, S>(
    State(state): State<AppState<L, S>>,
) -> Result<Json<Vec<ChatDto>>, ApiError>
where
    L: LlmClient + 'static,
    S: PolicyStore + 'static,
{
    let chats = state.chat_repository.list_chats().await?;
    tracing::debug!(count = chats.len(), "Listed chats");
    Ok(Json(chats.into_iter().map(ChatDto::from).collect()))
}

#[tracing::instrument(skip(state))]
pub async fn get_chat_handler<L, S>(
    State(state): State<AppState<L, S>>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<ChatDto>, ApiError>
where
    L: LlmClient + 'static,
    S: PolicyStore + 'static,
{
    state
        .chat_repository
        .get_chat(ChatId::from_uuid(chat_id))
        .await?
        .map(|chat| Json(ChatDto::from(chat)))
        .ok_or_else(|| ApiError::not_found(format!("Chat {} not found", chat_id)))
}

#[tracing::instrument(skip(state, request))]
pub async fn upsert_chat_handler<L, S>(
    State(state): State<AppState<L, S>>,
    Path(chat_id): Path<Uuid>,
    Json(request): Json<TitleRequest>,
) -> Result<StatusCode, ApiError>
where
    L: LlmClient + 'static,
    S: PolicyStore + 'static,
{
    state
        .chat_repository
        .create_chat(ChatId::from_uuid(chat_id), &request.title)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state, request))]
pub async fn rename_chat_handler<L, S>(
    State(state): State<AppState<L, S>>,
    Path(chat_id): Path<Uuid>,
    Json(request): Json<TitleRequest>,
) -> Result<StatusCode, ApiError>
where
    L: LlmClient + 'static,
    S: PolicyStore + 'static,
{
    state
        .chat_repository
        .update_chat_title(ChatId::from_uuid(chat_id), &request.title)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state))]
pub async fn delete_chat_handler<L, S>(
    State(state): State<AppState<L, S>>,
    Path(chat_id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
    L: LlmClient + 'static,
    S: PolicyStore + 'static,
{
    state
        .chat_repository
        .delete_chat(ChatId::from_uuid(chat_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state, request))]
pub async fn save_message_handler<L, S>(
    State(state): State<AppState<L, S>>,
    Path((chat_id, message_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SaveMessageRequest>,
) -> Result<StatusCode, ApiError>
where
    L: LlmClient + 'static,
    S: PolicyStore + 'static,
{
    let mut message = Message::new(ChatId::from_uuid(chat_id), request.role, request.content);
    message.id = MessageId::from_uuid(message_id);
    message.metadata = request.metadata;

    state.chat_repository.save_message(&message).await?;
    Ok(StatusCode::NO_CONTENT)
}
