use chrono::{DateTime, Utc};

use super::{ChatId, Message, MessageMetadata, MessageRole};

pub const DEFAULT_CHAT_TITLE: &str = "New chat";
const TITLE_PREVIEW_CHARS: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Chat {
    pub id: ChatId,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ChatId::new(),
            title: DEFAULT_CHAT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a message and, for the first user message of an untitled chat,
    /// derives the title from its content.
    pub fn append_message(
        &mut self,
        role: MessageRole,
        content: String,
        metadata: Option<MessageMetadata>,
    ) -> &Message {
        let mut message = Message::new(self.id, role, content);
        message.metadata = metadata;
        self.push(message)
    }

    pub fn push(&mut self, message: Message) -> &Message {
        let is_first_user_message = message.role == MessageRole::User
            && !self.messages.iter().any(|m| m.role == MessageRole::User);

        if is_first_user_message && self.title == DEFAULT_CHAT_TITLE {
            self.title = title_preview(&message.content);
        }

        self.updated_at = Utc::now();
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.updated_at = Utc::now();
    }

    /// Case-insensitive match on the title or any message body. Blank queries match.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }

        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self
                .messages
                .iter()
                .any(|m| m.content.to_lowercase().contains(&needle))
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self::new()
    }
}

fn title_preview(content: &str) -> String {
    let mut chars = content.chars();
    let preview: String = chars.by_ref().take(TITLE_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}
