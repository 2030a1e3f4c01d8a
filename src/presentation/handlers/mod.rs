mod chat;
mod chats;
mod error;
mod health;

pub use chat::{ChatRequest, ChatResponse, chat_handler, delete_thread_handler};
pub use chats::{
    ChatDto, MessageDto, delete_chat_handler, get_chat_handler, list_chats_handler,
    rename_chat_handler, save_message_handler, upsert_chat_handler,
};
pub use error::{ApiError, ErrorResponse};
pub use health::health_handler;
