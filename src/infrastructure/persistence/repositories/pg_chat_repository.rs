use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{ChatRepository, RepositoryError};
use crate::domain::{Chat, ChatId, Message, MessageId, MessageMetadata, MessageRole};

const FOREIGN_KEY_VIOLATION: &str = "23503";

pub struct PgChatRepository {
    pool: PgPool,
}

impl PgChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ChatRow {
    id: Uuid,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct MessageRow {
    id: Uuid,
    chat_id: Uuid,
    role: String,
    content: String,
    response_time_ms: Option<i64>,
    context_used: Option<bool>,
    tool_calls: Option<String>,
    error_occurred: bool,
    error_type: Option<String>,
    created_at: DateTime<Utc>,
}

impl ChatRow {
    fn into_chat(self, messages: Vec<Message>) -> Chat {
        Chat {
            id: ChatId::from_uuid(self.id),
            title: self.title,
            messages,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl TryFrom<MessageRow> for Message {
    type Error = RepositoryError;

    fn try_from(r: MessageRow) -> Result<Self, Self::Error> {
        let role = r
            .role
            .parse::<MessageRole>()
            .map_err(RepositoryError::QueryFailed)?;

        let metadata = MessageMetadata {
            response_time_ms: r.response_time_ms,
            context_used: r.context_used,
            tool_calls: MessageMetadata::tool_calls_from_column(r.tool_calls.as_deref()),
            error_occurred: r.error_occurred,
            error_type: r.error_type,
        };

        Ok(Message {
            id: MessageId::from_uuid(r.id),
            chat_id: ChatId::from_uuid(r.chat_id),
            role,
            content: r.content,
            metadata: (metadata != MessageMetadata::default()).then_some(metadata),
            created_at: r.created_at,
        })
    }
}

fn map_write_error(e: sqlx::Error) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
            RepositoryError::ConstraintViolation(db.message().to_string())
        }
        _ => RepositoryError::QueryFailed(e.to_string()),
    }
}

const SELECT_MESSAGES: &str = r#"
    SELECT id, chat_id, role, content, response_time_ms, context_used,
           tool_calls, error_occurred, error_type, created_at
    FROM messages
"#;

#[async_trait]
impl ChatRepository for PgChatRepository {
    #[instrument(skip(self, title), fields(chat_id = %id))]
    async fn create_chat(&self, id: ChatId, title: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO chats (id, title, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                updated_at = NOW()
            "#,
        )
        .bind(id.as_uuid())
        .bind(title)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    #[instrument(skip(self, message), fields(message_id = %message.id, chat_id = %message.chat_id))]
    async fn save_message(&self, message: &Message) -> Result<(), RepositoryError> {
        let metadata = message.metadata.clone().unwrap_or_default();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO messages (
                id, chat_id, role, content, response_time_ms,
                context_used, tool_calls, error_occurred, error_type, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                content = EXCLUDED.content,
                response_time_ms = EXCLUDED.response_time_ms,
                context_used = EXCLUDED.context_used,
                tool_calls = EXCLUDED.tool_calls,
                error_occurred = EXCLUDED.error_occurred,
                error_type = EXCLUDED.error_type
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.chat_id.as_uuid())
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(metadata.response_time_ms)
        .bind(metadata.context_used)
        .bind(metadata.tool_calls_column())
        .bind(metadata.error_occurred)
        .bind(&metadata.error_type)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        sqlx::query("UPDATE chats SET updated_at = NOW() WHERE id = $1")
            .bind(message.chat_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn list_chats(&self) -> Result<Vec<Chat>, RepositoryError> {
        let chat_rows: Vec<ChatRow> = sqlx::query_as(
            r#"
            SELECT id, title, created_at, updated_at
            FROM chats
            ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let message_rows: Vec<MessageRow> =
            sqlx::query_as(&format!("{SELECT_MESSAGES} ORDER BY created_at ASC"))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let mut messages_by_chat: HashMap<Uuid, Vec<Message>> = HashMap::new();
        for row in message_rows {
            let chat_id = row.chat_id;
            messages_by_chat
                .entry(chat_id)
                .or_default()
                .push(Message::try_from(row)?);
        }

        Ok(chat_rows
            .into_iter()
            .map(|row| {
                let messages = messages_by_chat.remove(&row.id).unwrap_or_default();
                row.into_chat(messages)
            })
            .collect())
    }

    #[instrument(skip(self), fields(chat_id = %id))]
    async fn get_chat(&self, id: ChatId) -> Result<Option<Chat>, RepositoryError> {
        let row: Option<ChatRow> = sqlx::query_as(
            r#"
            SELECT id, title, created_at, updated_at
            FROM chats
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let message_rows: Vec<MessageRow> = sqlx::query_as(&format!(
            "{SELECT_MESSAGES} WHERE chat_id = $1 ORDER BY created_at ASC"
        ))
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let messages = message_rows
            .into_iter()
            .map(Message::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(row.into_chat(messages)))
    }

    #[instrument(skip(self, title), fields(chat_id = %id))]
    async fn update_chat_title(&self, id: ChatId, title: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE chats SET title = $1, updated_at = NOW() WHERE id = $2")
            .bind(title)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("chat {}", id)));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(chat_id = %id))]
    async fn delete_chat(&self, id: ChatId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM chats WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }
}
