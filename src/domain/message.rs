use chrono::{DateTime, Utc};

use super::{ChatId, MessageId, MessageMetadata, MessageRole};

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub role: MessageRole,
    pub content: String,
    pub metadata: Option<MessageMetadata>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(chat_id: ChatId, role: MessageRole, content: String) -> Self {
        Self {
            id: MessageId::new(),
            chat_id,
            role,
            content,
            metadata: None,
            created_at: Utc::now(),
        }
    }
}
