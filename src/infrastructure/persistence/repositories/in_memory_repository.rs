use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::application::ports::{ChatRepository, ChatTurn, RepositoryError, ThreadMemory};
use crate::domain::{Chat, ChatId, Message, ThreadId};

/// Process-local chat history, used when no database is configured and in tests.
#[derive(Default)]
pub struct InMemoryChatRepository {
    chats: RwLock<HashMap<ChatId, Chat>>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn create_chat(&self, id: ChatId, title: &str) -> Result<(), RepositoryError> {
        let mut chats = self.chats.write().await;
        let now = Utc::now();
        chats
            .entry(id)
            .and_modify(|chat| {
                chat.title = title.to_string();
                chat.updated_at = now;
            })
            .or_insert_with(|| Chat {
                id,
                title: title.to_string(),
                messages: Vec::new(),
                created_at: now,
                updated_at: now,
            });
        Ok(())
    }

    async fn save_message(&self, message: &Message) -> Result<(), RepositoryError> {
        let mut chats = self.chats.write().await;
        let chat = chats.get_mut(&message.chat_id).ok_or_else(|| {
            RepositoryError::ConstraintViolation(format!("chat {} does not exist", message.chat_id))
        })?;

        match chat.messages.iter_mut().find(|m| m.id == message.id) {
            Some(existing) => {
                existing.content = message.content.clone();
                existing.metadata = message.metadata.clone();
            }
            None => {
                chat.messages.push(message.clone());
                chat.messages.sort_by_key(|m| m.created_at);
            }
        }
        chat.updated_at = Utc::now();
        Ok(())
    }

    async fn list_chats(&self) -> Result<Vec<Chat>, RepositoryError> {
        let chats = self.chats.read().await;
        let mut all: Vec<Chat> = chats.values().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }

    async fn get_chat(&self, id: ChatId) -> Result<Option<Chat>, RepositoryError> {
        Ok(self.chats.read().await.get(&id).cloned())
    }

    async fn update_chat_title(&self, id: ChatId, title: &str) -> Result<(), RepositoryError> {
        let mut chats = self.chats.write().await;
        let chat = chats
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("chat {}", id)))?;
        chat.rename(title);
        Ok(())
    }

    async fn delete_chat(&self, id: ChatId) -> Result<(), RepositoryError> {
        self.chats.write().await.remove(&id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryThreadMemory {
    threads: RwLock<HashMap<ThreadId, Vec<ChatTurn>>>,
}

impl InMemoryThreadMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ThreadMemory for InMemoryThreadMemory {
    async fn load(&self, thread_id: &ThreadId) -> Result<Vec<ChatTurn>, RepositoryError> {
        Ok(self
            .threads
            .read()
            .await
            .get(thread_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append(
        &self,
        thread_id: &ThreadId,
        turns: &[ChatTurn],
    ) -> Result<(), RepositoryError> {
        self.threads
            .write()
            .await
            .entry(thread_id.clone())
            .or_default()
            .extend_from_slice(turns);
        Ok(())
    }

    async fn delete(&self, thread_id: &ThreadId) -> Result<(), RepositoryError> {
        self.threads.write().await.remove(thread_id);
        Ok(())
    }
}
