use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{Chat, ChatId, Message, ThreadId};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default)]
    pub context_used: Option<bool>,
    #[serde(default)]
    pub tool_calls: Vec<String>,
}

/// Client-side view of the chat API: the agent endpoints plus the
/// chat-history store the client mirrors its state to.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_message(
        &self,
        message: &str,
        thread_id: &ThreadId,
    ) -> Result<ChatReply, ChatBackendError>;

    /// Drops the agent's conversation memory for the thread.
    async fn delete_thread(&self, thread_id: &ThreadId) -> Result<(), ChatBackendError>;

    async fn create_chat(&self, chat_id: ChatId, title: &str) -> Result<(), ChatBackendError>;

    async fn save_message(&self, message: &Message) -> Result<(), ChatBackendError>;

    async fn rename_chat(&self, chat_id: ChatId, title: &str) -> Result<(), ChatBackendError>;

    /// Removes the stored chat and its messages.
    async fn delete_chat(&self, chat_id: ChatId) -> Result<(), ChatBackendError>;

    /// Stored chats, most recently updated first.
    async fn list_chats(&self) -> Result<Vec<Chat>, ChatBackendError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ChatBackendError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("server error {status}: {detail}")]
    Server { status: u16, detail: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ChatBackendError {
    /// Short classifier recorded as `error_type` on failed replies.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatBackendError::RequestFailed(_) => "network_error",
            ChatBackendError::Server { .. } => "server_error",
            ChatBackendError::InvalidResponse(_) => "invalid_response",
        }
    }
}
