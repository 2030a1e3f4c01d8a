mod chat_backend;
mod chat_repository;
mod chat_turn;
mod embedder;
mod llm_client;
mod policy_store;
mod repository_error;
mod thread_memory;

pub use chat_backend::{ChatBackend, ChatBackendError, ChatReply};
pub use chat_repository::ChatRepository;
pub use chat_turn::{ChatTurn, ToolCall, ToolSpec, TurnRole};
pub use embedder::{Embedder, EmbedderError};
pub use llm_client::{Completion, LlmClient, LlmClientError};
pub use policy_store::{PolicyMatch, PolicyStore, PolicyStoreError};
pub use repository_error::RepositoryError;
pub use thread_memory::ThreadMemory;
