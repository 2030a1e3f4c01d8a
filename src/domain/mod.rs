mod chat;
mod chat_group;
mod chat_id;
mod embedding;
mod message;
mod message_id;
mod message_metadata;
mod message_role;
mod policy_chunk;
mod thread_id;

pub use chat::{Chat, DEFAULT_CHAT_TITLE};
pub use chat_group::{ChatGroup, DateBucket, group_chats_by_date};
pub use chat_id::ChatId;
pub use embedding::Embedding;
pub use message::Message;
pub use message_id::MessageId;
pub use message_metadata::MessageMetadata;
pub use message_role::MessageRole;
pub use policy_chunk::PolicyChunk;
pub use thread_id::{DEFAULT_THREAD_ID, ThreadId};
