use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{Chat, ChatId, Message};

/// Durable chat history: chats with their messages and per-message feedback.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Inserts the chat, or updates its title when the id already exists.
    async fn create_chat(&self, id: ChatId, title: &str) -> Result<(), RepositoryError>;

    /// Inserts the message, or replaces its content and metadata on conflict.
    async fn save_message(&self, message: &Message) -> Result<(), RepositoryError>;

    /// All chats, most recently updated first, messages oldest first.
    async fn list_chats(&self) -> Result<Vec<Chat>, RepositoryError>;

    async fn get_chat(&self, id: ChatId) -> Result<Option<Chat>, RepositoryError>;

    async fn update_chat_title(&self, id: ChatId, title: &str) -> Result<(), RepositoryError>;

    async fn delete_chat(&self, id: ChatId) -> Result<(), RepositoryError>;
}
