use std::sync::Arc;
use std::time::Instant;

use tracing::{error, instrument, warn};

use crate::application::ports::{ChatBackend, ChatBackendError};
use crate::domain::{Chat, ChatId, MessageMetadata, MessageRole, ThreadId};

pub const ERROR_REPLY: &str = "Sorry, something went wrong while getting a response. Please try again.";

/// Client-side chat state: the sidebar's chat list, the active thread and the
/// loading flag. Every change is mirrored to the backend optimistically; a
/// failed remote write is logged and the local state is kept.
pub struct ChatSession {
    chats: Vec<Chat>,
    active_chat_id: Option<ChatId>,
    is_loading: bool,
    backend: Arc<dyn ChatBackend>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            chats: Vec::new(),
            active_chat_id: None,
            is_loading: false,
            backend,
        }
    }

    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn active_chat(&self) -> Option<&Chat> {
        let id = self.active_chat_id?;
        self.chats.iter().find(|c| c.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    /// Replaces the local list with the backend's stored chats. The active chat
    /// is kept when it is still present.
    #[instrument(skip(self))]
    pub async fn load_chats(&mut self) -> Result<usize, ChatBackendError> {
        self.chats = self.backend.list_chats().await?;
        if let Some(active) = self.active_chat_id {
            if !self.chats.iter().any(|c| c.id == active) {
                self.active_chat_id = None;
            }
        }
        Ok(self.chats.len())
    }

    pub async fn create_new_chat(&mut self) -> ChatId {
        let chat = Chat::new();
        let id = chat.id;
        let title = chat.title.clone();
        self.chats.insert(0, chat);
        self.active_chat_id = Some(id);

        if let Err(e) = self.backend.create_chat(id, &title).await {
            error!(chat_id = %id, error = %e, "Failed to store new chat");
        }
        id
    }

    pub fn select_chat(&mut self, chat_id: ChatId) {
        if self.chats.iter().any(|c| c.id == chat_id) {
            self.active_chat_id = Some(chat_id);
        } else {
            warn!(chat_id = %chat_id, "Ignoring selection of unknown chat");
        }
    }

    /// Appends to `chat_id`, or to the active chat. Without a target this is a no-op.
    pub async fn add_message(
        &mut self,
        role: MessageRole,
        content: String,
        metadata: Option<MessageMetadata>,
        chat_id: Option<ChatId>,
    ) {
        let Some(target) = chat_id.or(self.active_chat_id) else {
            return;
        };
        let Some(chat) = self.chats.iter_mut().find(|c| c.id == target) else {
            return;
        };

        let previous_title = chat.title.clone();
        let message = chat.append_message(role, content, metadata).clone();
        let new_title = (chat.title != previous_title).then(|| chat.title.clone());

        if let Err(e) = self.backend.save_message(&message).await {
            error!(chat_id = %target, error = %e, "Failed to store message");
        }
        if let Some(title) = new_title {
            if let Err(e) = self.backend.rename_chat(target, &title).await {
                error!(chat_id = %target, error = %e, "Failed to store chat title");
            }
        }
    }

    pub async fn update_chat_title(&mut self, chat_id: ChatId, title: impl Into<String>) {
        let Some(chat) = self.chats.iter_mut().find(|c| c.id == chat_id) else {
            return;
        };
        chat.rename(title);
        let title = chat.title.clone();

        if let Err(e) = self.backend.rename_chat(chat_id, &title).await {
            error!(chat_id = %chat_id, error = %e, "Failed to store chat title");
        }
    }

    /// Drops the backend thread and stored history, then removes the chat
    /// locally regardless of the outcome.
    #[instrument(skip(self, chat_id), fields(chat_id = %chat_id))]
    pub async fn delete_chat(&mut self, chat_id: ChatId) {
        if let Err(e) = self.backend.delete_thread(&ThreadId::from(chat_id)).await {
            error!(error = %e, "Failed to delete chat memory");
        }
        if let Err(e) = self.backend.delete_chat(chat_id).await {
            error!(error = %e, "Failed to delete stored chat");
        }

        self.chats.retain(|c| c.id != chat_id);
        if self.active_chat_id == Some(chat_id) {
            self.active_chat_id = self.chats.first().map(|c| c.id);
        }
    }

    /// Posts `content` to the active chat (creating one when needed) and records
    /// the reply, or an error reply, with response metadata.
    #[instrument(skip(self, content))]
    pub async fn send_message(&mut self, content: &str) -> Result<ChatId, SessionError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        if self.is_loading {
            return Err(SessionError::RequestInFlight);
        }

        let chat_id = match self.active_chat().map(|c| c.id) {
            Some(id) => id,
            None => self.create_new_chat().await,
        };

        self.add_message(MessageRole::User, content.to_string(), None, Some(chat_id))
            .await;
        self.is_loading = true;

        let started = Instant::now();
        let result = self
            .backend
            .send_message(content, &ThreadId::from(chat_id))
            .await;
        let elapsed_ms = started.elapsed().as_millis() as i64;

        match result {
            Ok(reply) => {
                let metadata = MessageMetadata {
                    context_used: reply.context_used,
                    tool_calls: (!reply.tool_calls.is_empty()).then_some(reply.tool_calls),
                    ..MessageMetadata::success(elapsed_ms)
                };
                self.add_message(
                    MessageRole::Assistant,
                    reply.reply,
                    Some(metadata),
                    Some(chat_id),
                )
                .await;
            }
            Err(e) => {
                error!(error = %e, "Chat request failed");
                self.add_message(
                    MessageRole::Assistant,
                    ERROR_REPLY.to_string(),
                    Some(MessageMetadata::failure(elapsed_ms, e.kind())),
                    Some(chat_id),
                )
                .await;
            }
        }

        self.is_loading = false;
        Ok(chat_id)
    }

    /// Chats whose title or messages contain `query`, in sidebar order.
    pub fn search(&self, query: &str) -> Vec<&Chat> {
        self.chats.iter().filter(|c| c.matches(query)).collect()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("a request is already in flight")]
    RequestInFlight,
}
