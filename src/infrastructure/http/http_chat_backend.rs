use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::application::ports::{ChatBackend, ChatBackendError, ChatReply};
use crate::domain::{Chat, ChatId, Message, MessageId, MessageMetadata, MessageRole, ThreadId};

/// `ChatBackend` over the service's own JSON API.
pub struct HttpChatBackend {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    thread_id: &'a str,
}

#[derive(Serialize)]
struct TitleRequest<'a> {
    title: &'a str,
}

#[derive(Serialize)]
struct SaveMessageRequest<'a> {
    role: MessageRole,
    content: &'a str,
    metadata: Option<&'a MessageMetadata>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

#[derive(Deserialize)]
struct StoredChat {
    id: String,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    messages: Vec<StoredMessage>,
}

#[derive(Deserialize)]
struct StoredMessage {
    id: String,
    role: MessageRole,
    content: String,
    #[serde(default)]
    metadata: Option<MessageMetadata>,
    created_at: DateTime<Utc>,
}

impl StoredChat {
    fn into_chat(self) -> Result<Chat, ChatBackendError> {
        let chat_id = self
            .id
            .parse::<ChatId>()
            .map_err(|e| ChatBackendError::InvalidResponse(format!("chat id {}: {}", self.id, e)))?;

        let messages = self
            .messages
            .into_iter()
            .map(|m| {
                let id = m.id.parse::<MessageId>().map_err(|e| {
                    ChatBackendError::InvalidResponse(format!("message id {}: {}", m.id, e))
                })?;
                Ok(Message {
                    id,
                    chat_id,
                    role: m.role,
                    content: m.content,
                    metadata: m.metadata,
                    created_at: m.created_at,
                })
            })
            .collect::<Result<Vec<_>, ChatBackendError>>()?;

        Ok(Chat {
            id: chat_id,
            title: self.title,
            messages,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl HttpChatBackend {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn chat_url(&self, chat_id: ChatId) -> String {
        format!("{}/api/chats/{}", self.base_url, chat_id)
    }

    async fn send(request: RequestBuilder) -> Result<reqwest::Response, ChatBackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| ChatBackendError::RequestFailed(e.to_string()))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::error_from(response).await)
        }
    }

    async fn error_from(response: reqwest::Response) -> ChatBackendError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| match e.detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or(body);

        ChatBackendError::Server {
            status: status.as_u16(),
            detail,
        }
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    #[instrument(skip(self, message, thread_id), fields(thread_id = %thread_id))]
    async fn send_message(
        &self,
        message: &str,
        thread_id: &ThreadId,
    ) -> Result<ChatReply, ChatBackendError> {
        let response = Self::send(self.client.post(format!("{}/chat", self.base_url)).json(
            &ChatRequest {
                message,
                thread_id: thread_id.as_str(),
            },
        ))
        .await?;

        response
            .json::<ChatReply>()
            .await
            .map_err(|e| ChatBackendError::InvalidResponse(e.to_string()))
    }

    #[instrument(skip(self, thread_id), fields(thread_id = %thread_id))]
    async fn delete_thread(&self, thread_id: &ThreadId) -> Result<(), ChatBackendError> {
        let response = self
            .client
            .delete(format!("{}/chat/{}", self.base_url, thread_id.as_str()))
            .send()
            .await
            .map_err(|e| ChatBackendError::RequestFailed(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Ok(()),
            _ => Err(Self::error_from(response).await),
        }
    }

    #[instrument(skip(self, title))]
    async fn create_chat(&self, chat_id: ChatId, title: &str) -> Result<(), ChatBackendError> {
        Self::send(self.client.put(self.chat_url(chat_id)).json(&TitleRequest { title })).await?;
        Ok(())
    }

    #[instrument(skip(self, message), fields(chat_id = %message.chat_id, message_id = %message.id))]
    async fn save_message(&self, message: &Message) -> Result<(), ChatBackendError> {
        let url = format!("{}/messages/{}", self.chat_url(message.chat_id), message.id);
        let body = SaveMessageRequest {
            role: message.role,
            content: &message.content,
            metadata: message.metadata.as_ref(),
        };

        Self::send(self.client.put(url).json(&body)).await?;
        Ok(())
    }

    #[instrument(skip(self, title))]
    async fn rename_chat(&self, chat_id: ChatId, title: &str) -> Result<(), ChatBackendError> {
        let url = format!("{}/title", self.chat_url(chat_id));
        Self::send(self.client.patch(url).json(&TitleRequest { title })).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_chat(&self, chat_id: ChatId) -> Result<(), ChatBackendError> {
        Self::send(self.client.delete(self.chat_url(chat_id))).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_chats(&self) -> Result<Vec<Chat>, ChatBackendError> {
        let stored = Self::send(self.client.get(format!("{}/api/chats", self.base_url)))
            .await?
            .json::<Vec<StoredChat>>()
            .await
            .map_err(|e| ChatBackendError::InvalidResponse(e.to_string()))?;

        stored.into_iter().map(StoredChat::into_chat).collect()
    }
}
